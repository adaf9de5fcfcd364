use std::path::Path;
use tong_core::{parse, tokenize};
use super::read_source;

pub fn print_tokens(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    for token in tokenize(&source) {
        println!("{}", token);
    }
    Ok(())
}

pub fn print_ast(path: &Path, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    let program = parse(&source)?;
    println!("{}", program.to_json(pretty)?);
    Ok(())
}

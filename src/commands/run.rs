use std::path::Path;
use log::info;
use tong_core::{Interpreter, parse};
use super::read_source;

pub fn run_file(path: &Path, interpreter: &Interpreter) -> Result<(), Box<dyn std::error::Error>> {
    let source = read_source(path)?;
    info!("Running {}", path.display());

    let program = parse(&source)?;
    interpreter.interpret(&program)?;
    Ok(())
}

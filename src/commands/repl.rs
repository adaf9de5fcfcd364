use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use log::debug;
use tong_core::language::ast::Statement;
use tong_core::{ControlFlow, Error, Interpreter, TokenType, Value, parse, tokenize};

const PROMPT: &str = "tong> ";
const CONTINUATION_PROMPT: &str = "...> ";

const HELP: &str = "\
Commands:
  help        show this message
  vars        list variables defined in this session
  clear       forget every definition
  exit, quit  leave the session
Anything else is run as TONG code. Input continues while braces are open.";

/// Net count of open braces in `source`, ignoring braces inside strings and comments.
fn open_braces(source: &str) -> i64 {
    tokenize(source).iter().fold(0, |depth, token| match token.token_type {
        TokenType::LBrace => depth + 1,
        TokenType::RBrace => depth - 1,
        _ => depth,
    })
}

/// Runs one accepted input and echoes the value of a trailing expression.
fn evaluate(interpreter: &Interpreter, source: &str) -> tong_core::Result<Option<Value>> {
    let program = parse(source)?;
    let mut last = None;

    for stmt in &program.statements {
        last = None;
        match interpreter.execute_statement(stmt, interpreter.globals())? {
            ControlFlow::Normal(value) => {
                if matches!(stmt, Statement::Expression(_)) && !value.is_none() {
                    last = Some(value);
                }
            }
            ControlFlow::Return(_) => break,
            flow => return Err(Error::runtime(format!("'{}' outside of a loop", flow.keyword()))),
        }
    }

    Ok(last)
}

fn print_vars(interpreter: &Interpreter, builtins: &HashSet<String>) {
    let bindings: Vec<(String, Value)> = interpreter
        .globals()
        .local_bindings()
        .into_iter()
        .filter(|(name, _)| !builtins.contains(name))
        .collect();

    if bindings.is_empty() {
        println!("(no variables)");
    }
    for (name, value) in bindings {
        println!("{}: {} = {}", name, value.type_name(), value);
    }
}

pub fn start<F>(build: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: Fn() -> Result<Interpreter, Box<dyn std::error::Error>>,
{
    let mut interpreter = build()?;
    let builtins: HashSet<String> = interpreter
        .globals()
        .local_bindings()
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    println!("TONG {} interactive session. Type 'help' for commands.", env!("CARGO_PKG_VERSION"));

    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("{}", if buffer.is_empty() { PROMPT } else { CONTINUATION_PROMPT });
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        if buffer.is_empty() {
            match line.trim() {
                "" => continue,
                "exit" | "quit" => break,
                "help" => {
                    println!("{}", HELP);
                    continue;
                }
                "vars" => {
                    print_vars(&interpreter, &builtins);
                    continue;
                }
                "clear" => {
                    interpreter = build()?;
                    println!("Environment cleared");
                    continue;
                }
                _ => {}
            }
        }

        buffer.push_str(&line);
        if open_braces(&buffer) > 0 {
            continue;
        }

        let source = std::mem::take(&mut buffer);
        debug!("Evaluating {} bytes of input", source.len());
        match evaluate(&interpreter, &source) {
            Ok(Some(value)) => println!("{}", value),
            Ok(None) => {}
            Err(e) => eprintln!("{}", e),
        }
    }

    Ok(())
}

use std::f64::consts;
use crate::language::error::Result;
use crate::language::interpreter::Interpreter;
use crate::language::interpreter::environment::Environment;
use crate::language::interpreter::value::Value;
use crate::runtime_error;
use super::expect_args;

pub fn install(globals: &Environment) {
    globals.define("print", Value::native("print", print));
    globals.define("len", Value::native("len", len));
    globals.define("import", Value::native("import", import));
    globals.define("PI", Value::Float(consts::PI));
    globals.define("E", Value::Float(consts::E));
}

/// Writes the arguments separated by spaces, then a newline.
fn print(interpreter: &Interpreter, args: Vec<Value>) -> Result<Value> {
    let line = args.iter().map(Value::to_string).collect::<Vec<_>>().join(" ");
    interpreter.output().write_line(&line)?;
    Ok(Value::None)
}

fn len(_: &Interpreter, args: Vec<Value>) -> Result<Value> {
    let [value] = expect_args::<1>("len", args)?;
    match &value {
        Value::Array(items) => Ok(Value::Integer(items.len() as i64)),
        Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
        other => runtime_error!("len() not supported for type {}", other.type_name()),
    }
}

fn import(interpreter: &Interpreter, args: Vec<Value>) -> Result<Value> {
    let [name] = expect_args::<1>("import", args)?;
    match &name {
        Value::String(name) => interpreter.import_module(name),
        other => runtime_error!("import() expects a module name, found {}", other.type_name()),
    }
}

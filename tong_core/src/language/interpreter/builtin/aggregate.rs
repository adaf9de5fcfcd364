use std::sync::Arc;
use log::debug;
use crate::language::error::Result;
use crate::language::interpreter::Interpreter;
use crate::language::interpreter::environment::Environment;
use crate::language::interpreter::operators;
use crate::language::interpreter::task_runner::Task;
use crate::language::interpreter::value::Value;
use crate::runtime_error;
use super::expect_args;

pub fn install(globals: &Environment) {
    globals.define("sum", Value::native("sum", sum));
    globals.define("map", Value::native("map", map));
    globals.define("filter", Value::native("filter", filter));
    globals.define("reduce", Value::native("reduce", reduce));
}

fn array_arg<'a>(function: &str, value: &'a Value) -> Result<&'a Arc<Vec<Value>>> {
    match value {
        Value::Array(items) => Ok(items),
        other => runtime_error!("{}() requires an array, found {}", function, other.type_name()),
    }
}

fn function_arg(function: &str, value: &Value) -> Result<()> {
    match value {
        Value::Function(_) => Ok(()),
        other => runtime_error!("{}() requires a function, found {}", function, other.type_name()),
    }
}

fn should_split(interpreter: &Interpreter, len: usize, threshold: usize) -> bool {
    len > threshold && interpreter.runner().parallelism() > 1
}

/// Splits `items` into one contiguous chunk per worker, applies `work` to each
/// chunk on the task runner and returns the per-chunk results in order.
fn chunked<F>(interpreter: &Interpreter, items: &Arc<Vec<Value>>, work: F) -> Result<Vec<Value>>
where
    F: Fn(&Interpreter, &[Value]) -> Result<Value> + Clone + Send + 'static,
{
    let chunk_size = items.len().div_ceil(interpreter.runner().parallelism().max(1)).max(1);
    let tasks: Vec<Task> = (0..items.len())
        .step_by(chunk_size)
        .map(|start| {
            let end = (start + chunk_size).min(items.len());
            let items = Arc::clone(items);
            let interpreter = interpreter.clone();
            let work = work.clone();
            Box::new(move || work(&interpreter, &items[start..end])) as Task
        })
        .collect();

    debug!("Split {} elements into {} chunks", items.len(), tasks.len());
    interpreter.runner().run_all(tasks)
}

fn fold_add(items: &[Value]) -> Result<Value> {
    let Some((first, rest)) = items.split_first() else {
        return Ok(Value::Integer(0));
    };
    rest.iter().try_fold(first.clone(), |total, item| operators::add(&total, item))
}

fn sum(interpreter: &Interpreter, args: Vec<Value>) -> Result<Value> {
    let [array] = expect_args::<1>("sum", args)?;
    let items = array_arg("sum", &array)?;

    if should_split(interpreter, items.len(), interpreter.config().sum_parallel_threshold) {
        let partials = chunked(interpreter, items, |_, chunk| fold_add(chunk))?;
        return fold_add(&partials);
    }
    fold_add(items)
}

fn map_chunk(interpreter: &Interpreter, chunk: &[Value], function: &Value) -> Result<Value> {
    let mapped = chunk
        .iter()
        .map(|item| interpreter.call_function(function, vec![item.clone()]))
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::array(mapped))
}

fn map(interpreter: &Interpreter, args: Vec<Value>) -> Result<Value> {
    let [array, function] = expect_args::<2>("map", args)?;
    let items = array_arg("map", &array)?;
    function_arg("map", &function)?;

    if !should_split(interpreter, items.len(), interpreter.config().map_parallel_threshold) {
        return map_chunk(interpreter, items, &function);
    }

    let chunks = chunked(interpreter, items, move |interpreter, chunk| map_chunk(interpreter, chunk, &function))?;
    let mut mapped = Vec::with_capacity(items.len());
    for chunk in &chunks {
        if let Value::Array(values) = chunk {
            mapped.extend(values.iter().cloned());
        }
    }
    Ok(Value::array(mapped))
}

fn filter(interpreter: &Interpreter, args: Vec<Value>) -> Result<Value> {
    let [array, predicate] = expect_args::<2>("filter", args)?;
    let items = array_arg("filter", &array)?;
    function_arg("filter", &predicate)?;

    let mut kept = Vec::new();
    for item in items.iter() {
        if interpreter.call_function(&predicate, vec![item.clone()])?.is_truthy() {
            kept.push(item.clone());
        }
    }
    Ok(Value::array(kept))
}

fn reduce(interpreter: &Interpreter, args: Vec<Value>) -> Result<Value> {
    let [array, function, initial] = expect_args::<3>("reduce", args)?;
    let items = array_arg("reduce", &array)?;
    function_arg("reduce", &function)?;

    items
        .iter()
        .try_fold(initial, |acc, item| interpreter.call_function(&function, vec![acc, item.clone()]))
}

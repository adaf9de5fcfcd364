pub mod inspect;
pub mod repl;
pub mod run;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;
use tong_core::{Interpreter, ThreadPoolRunner};
use crate::config::{RunnerKind, RuntimeConfigure};

pub fn read_source(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    Ok(source)
}

/// Builds an interpreter for the configured runner. `force_threads` comes
/// from the command line and wins over the config file.
pub fn build_interpreter(runtime: &RuntimeConfigure, force_threads: bool) -> Result<Interpreter, Box<dyn std::error::Error>> {
    let interpreter = Interpreter::new().with_config(runtime.interpreter_config());

    if runtime.runner == RunnerKind::Sequential && !force_threads {
        return Ok(interpreter);
    }

    let runner = match runtime.workers {
        Some(workers) => ThreadPoolRunner::new(workers)?,
        None => ThreadPoolRunner::with_available_parallelism()?,
    };
    info!("Using thread pool runner: {:?}", runner);
    Ok(interpreter.with_runner(Arc::new(runner)))
}

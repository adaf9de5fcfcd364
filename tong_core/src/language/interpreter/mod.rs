mod evaluator;
mod executor;
mod operators;
pub mod builtin;
pub mod control;
pub mod environment;
pub mod output;
pub mod task_runner;
pub mod value;

use std::fmt;
use std::sync::Arc;
use log::{debug, info};
use crate::language::ast::{Expression, Program, Statement};
use crate::language::error::Result;
use crate::language::parser;
use crate::runtime_error;
use builtin::ModuleRegistry;
use control::ControlFlow;
use environment::Environment;
use evaluator::Evaluator;
use executor::Executor;
use output::Output;
use task_runner::{SequentialRunner, TaskRunner};
use value::Value;

pub const DEFAULT_SUM_PARALLEL_THRESHOLD: usize = 1000;
pub const DEFAULT_MAP_PARALLEL_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// `sum` splits arrays longer than this across the task runner.
    pub sum_parallel_threshold: usize,
    /// `map` splits arrays longer than this across the task runner.
    pub map_parallel_threshold: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            sum_parallel_threshold: DEFAULT_SUM_PARALLEL_THRESHOLD,
            map_parallel_threshold: DEFAULT_MAP_PARALLEL_THRESHOLD,
        }
    }
}

/// Tree-walking interpreter. Cloning is cheap and clones share globals,
/// modules, the task runner and the output sink.
#[derive(Clone)]
pub struct Interpreter {
    globals: Environment,
    modules: Arc<ModuleRegistry>,
    runner: Arc<dyn TaskRunner>,
    output: Output,
    config: InterpreterConfig,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new();
        builtin::install(&globals);

        Interpreter {
            globals,
            modules: Arc::new(ModuleRegistry::with_builtins()),
            runner: Arc::new(SequentialRunner),
            output: Output::stdout(),
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn TaskRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_modules(mut self, modules: Arc<ModuleRegistry>) -> Self {
        self.modules = modules;
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn runner(&self) -> &dyn TaskRunner {
        self.runner.as_ref()
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Runs a whole program in the global environment. A top-level `return`
    /// stops the program early.
    pub fn interpret(&self, program: &Program) -> Result<()> {
        info!("Interpreting program with {} statements", program.statements.len());

        for stmt in &program.statements {
            match self.execute_statement(stmt, &self.globals)? {
                ControlFlow::Normal(_) => {}
                ControlFlow::Return(value) => {
                    debug!("Top-level return with {}, stopping", value);
                    break;
                }
                flow => return runtime_error!("'{}' outside of a loop", flow.keyword()),
            }
        }

        Ok(())
    }

    /// Parses and runs `source`.
    pub fn run_source(&self, source: &str) -> Result<()> {
        let program = parser::parse(source)?;
        self.interpret(&program)
    }

    pub fn execute_statement(&self, stmt: &Statement, env: &Environment) -> Result<ControlFlow> {
        Executor::new(self, env).execute(stmt)
    }

    pub fn evaluate_expression(&self, expr: &Expression, env: &Environment) -> Result<Value> {
        Evaluator::new(self, env).evaluate(expr)
    }

    pub fn call_function(&self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        Evaluator::new(self, &self.globals).call_function(callee, args)
    }

    pub fn import_module(&self, name: &str) -> Result<Value> {
        self.modules.import(name)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("globals", &self.globals)
            .field("modules", &self.modules)
            .field("runner", &self.runner)
            .field("config", &self.config)
            .finish()
    }
}

use std::sync::Arc;
use log::{debug, trace};
use crate::language::ast::{Expression, MatchArm, Parameter, Statement};
use crate::language::error::Result;
use crate::runtime_error;
use super::Interpreter;
use super::control::ControlFlow;
use super::environment::Environment;
use super::executor::Executor;
use super::operators;
use super::task_runner::Task;
use super::value::{Function, Value};

pub struct Evaluator<'a> {
    interpreter: &'a Interpreter,
    env: &'a Environment,
}

impl<'a> Evaluator<'a> {
    pub fn new(interpreter: &'a Interpreter, env: &'a Environment) -> Self {
        Evaluator { interpreter, env }
    }

    pub fn evaluate(&self, expr: &Expression) -> Result<Value> {
        trace!("Evaluating expression: {}", expr);
        match expr {
            Expression::Integer(n) => Ok(Value::Integer(*n)),
            Expression::Float(n) => Ok(Value::Float(*n)),
            Expression::String(s) => Ok(Value::String(s.clone())),
            Expression::Boolean(b) => Ok(Value::Boolean(*b)),
            Expression::None => Ok(Value::None),
            Expression::Array(elements) => Ok(Value::array(self.evaluate_arguments(elements)?)),
            Expression::Identifier(name) => self.env.get(name),
            Expression::FieldAccess { object, field } => {
                let object = self.evaluate(object)?;
                self.evaluate_field_access(&object, field)
            }
            Expression::Index { object, index } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                self.evaluate_index(&object, &index)
            }
            Expression::MethodCall { object, method, args } => {
                let object = self.evaluate(object)?;
                let method = self.evaluate_field_access(&object, method)?;
                let args = self.evaluate_arguments(args)?;
                self.call_function(&method, args)
            }
            Expression::Binary { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                operators::binary(*operator, &left, &right)
            }
            Expression::Unary { operator, operand } => {
                let operand = self.evaluate(operand)?;
                operators::unary(*operator, &operand)
            }
            Expression::Call { callee, args } => {
                let callee = self.evaluate(callee)?;
                let args = self.evaluate_arguments(args)?;
                self.call_function(&callee, args)
            }
            Expression::Lambda(lambda) => Ok(Value::Function(Arc::new(Function::Lambda {
                lambda: Arc::clone(lambda),
                closure: self.env.clone(),
            }))),
            Expression::If { condition, then_branch, else_branch } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.evaluate(else_branch)
                } else {
                    Ok(Value::None)
                }
            }
            Expression::Match { subject, arms } => self.evaluate_match(subject, arms),
            // Evaluation is synchronous, so the awaited value is already complete.
            Expression::Await(inner) => self.evaluate(inner),
            Expression::Parallel(statements) => self.evaluate_concurrent_block(statements, "parallel"),
            Expression::Distributed(statements) => self.evaluate_concurrent_block(statements, "distributed"),
            Expression::GpuKernelCall { kernel, args } => {
                let kernel = self.evaluate(kernel)?;
                let args = self.evaluate_arguments(args)?;
                debug!("No GPU backend available, running kernel {} on the CPU", kernel);
                self.call_function(&kernel, args)
            }
        }
    }

    fn evaluate_arguments(&self, args: &[Expression]) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.evaluate(arg)).collect()
    }

    fn evaluate_field_access(&self, object: &Value, field: &str) -> Result<Value> {
        match (object, field) {
            (Value::Array(items), "length") => Ok(Value::Integer(items.len() as i64)),
            (Value::String(s), "length") => Ok(Value::Integer(s.chars().count() as i64)),
            (Value::Module(module), _) => match module.export(field) {
                Some(value) => Ok(value.clone()),
                None => runtime_error!("Module '{}' has no export '{}'", module.name, field),
            },
            _ => runtime_error!("No field '{}' on type {}", field, object.type_name()),
        }
    }

    fn evaluate_index(&self, object: &Value, index: &Value) -> Result<Value> {
        match (object, index) {
            (Value::Array(items), Value::Integer(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .map_or_else(|| runtime_error!("Array index out of bounds"), Ok),
            (Value::String(s), Value::Integer(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map_or_else(|| runtime_error!("String index out of bounds"), |ch| Ok(Value::String(ch.to_string()))),
            _ => runtime_error!("Cannot index {} with {}", object.type_name(), index.type_name()),
        }
    }

    pub(super) fn evaluate_match(&self, subject: &Expression, arms: &[MatchArm]) -> Result<Value> {
        let subject = self.evaluate(subject)?;
        trace!("Matching on {}", subject);

        for arm in arms {
            let accepted = match &arm.guard {
                Some(guard) => self.evaluate(guard)?.is_truthy(),
                None => true,
            };
            if accepted {
                return self.evaluate(&arm.body);
            }
        }

        Ok(Value::None)
    }

    /// Runs each statement as an independent task in its own child scope.
    /// The block's value is the last non-None task result.
    fn evaluate_concurrent_block(&self, statements: &Arc<Vec<Statement>>, label: &'static str) -> Result<Value> {
        debug!("Running {} block with {} statements", label, statements.len());

        let tasks: Vec<Task> = (0..statements.len())
            .map(|i| {
                let interpreter = self.interpreter.clone();
                let statements = Arc::clone(statements);
                let scope = Environment::with_parent(self.env);
                Box::new(move || match interpreter.execute_statement(&statements[i], &scope)? {
                    ControlFlow::Normal(value) | ControlFlow::Return(value) => Ok(value),
                    flow => runtime_error!("'{}' cannot leave a {} block", flow.keyword(), label),
                }) as Task
            })
            .collect();

        let results = self.interpreter.runner().run_all(tasks)?;
        Ok(results.into_iter().rev().find(|value| !value.is_none()).unwrap_or(Value::None))
    }

    pub fn call_function(&self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        let Value::Function(function) = callee else {
            return runtime_error!("Cannot call non-function value: {}", callee.type_name());
        };
        trace!("Calling {:?} with {} arguments", function, args.len());

        match function.as_ref() {
            Function::Native(native) => (native.func)(self.interpreter, args),
            Function::Declared { declaration, closure } => {
                if declaration.is_gpu_kernel {
                    debug!("No GPU backend available, running kernel '{}' on the CPU", declaration.name);
                }
                let frame = self.bind_parameters(&declaration.params, args, closure)?;
                match Executor::new(self.interpreter, &frame).execute_block(&declaration.body)? {
                    ControlFlow::Normal(_) => Ok(Value::None),
                    ControlFlow::Return(value) => Ok(value),
                    flow => runtime_error!("'{}' outside of a loop in function '{}'", flow.keyword(), declaration.name),
                }
            }
            Function::Lambda { lambda, closure } => {
                let frame = self.bind_parameters(&lambda.params, args, closure)?;
                Evaluator::new(self.interpreter, &frame).evaluate(&lambda.body)
            }
        }
    }

    /// Binds arguments positionally in a fresh frame over `closure`. Missing
    /// arguments fall back to defaults evaluated in the closure; surplus
    /// arguments are dropped.
    fn bind_parameters(&self, params: &[Parameter], args: Vec<Value>, closure: &Environment) -> Result<Environment> {
        let frame = Environment::with_parent(closure);
        let mut args = args.into_iter();

        for param in params {
            let value = match (args.next(), &param.default_value) {
                (Some(value), _) => value,
                (None, Some(default)) => Evaluator::new(self.interpreter, closure).evaluate(default)?,
                (None, None) => return runtime_error!("Missing argument for parameter {}", param.name),
            };
            frame.define(param.name.clone(), value);
        }

        Ok(frame)
    }
}

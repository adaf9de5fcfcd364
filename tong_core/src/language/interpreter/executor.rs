use std::collections::HashMap;
use std::sync::Arc;
use log::{debug, trace};
use crate::language::ast::{Expression, Statement};
use crate::language::error::Result;
use crate::runtime_error;
use super::Interpreter;
use super::control::ControlFlow;
use super::environment::Environment;
use super::evaluator::Evaluator;
use super::value::{Function, Module, Value};

pub struct Executor<'a> {
    interpreter: &'a Interpreter,
    env: &'a Environment,
}

impl<'a> Executor<'a> {
    pub fn new(interpreter: &'a Interpreter, env: &'a Environment) -> Self {
        Executor { interpreter, env }
    }

    fn evaluate(&self, expr: &Expression) -> Result<Value> {
        Evaluator::new(self.interpreter, self.env).evaluate(expr)
    }

    pub fn execute(&self, stmt: &Statement) -> Result<ControlFlow> {
        match stmt {
            Statement::Expression(expr) => Ok(ControlFlow::Normal(self.evaluate(expr)?)),
            Statement::VariableDeclaration { name, initializer, .. } => {
                let value = match initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::None,
                };
                trace!("Defining '{}' = {}", name, value);
                self.env.define(name.clone(), value);
                Ok(ControlFlow::Normal(Value::None))
            }
            Statement::Assignment { target, value } => {
                let value = self.evaluate(value)?;
                let Expression::Identifier(name) = target else {
                    return runtime_error!("Invalid assignment target");
                };
                self.env.assign(name, value)?;
                Ok(ControlFlow::Normal(Value::None))
            }
            Statement::FunctionDeclaration(declaration) => {
                let function = Function::Declared {
                    declaration: Arc::clone(declaration),
                    closure: self.env.clone(),
                };
                self.env.define(declaration.name.clone(), Value::Function(Arc::new(function)));
                Ok(ControlFlow::Normal(Value::None))
            }
            Statement::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::None,
                };
                Ok(ControlFlow::Return(value))
            }
            Statement::Break => Ok(ControlFlow::Break),
            Statement::Continue => Ok(ControlFlow::Continue),
            Statement::If { condition, then_branch, else_branch } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute_block(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(else_branch)
                } else {
                    Ok(ControlFlow::Normal(Value::None))
                }
            }
            Statement::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute_block(body)? {
                        ControlFlow::Break => break,
                        ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
                        ControlFlow::Normal(_) | ControlFlow::Continue => {}
                    }
                }
                Ok(ControlFlow::Normal(Value::None))
            }
            Statement::For { variable, iterable, body } => {
                let iterable = self.evaluate(iterable)?;
                let Value::Array(items) = &iterable else {
                    return runtime_error!("Cannot iterate over {}", iterable.type_name());
                };
                for item in items.iter() {
                    self.env.define(variable.clone(), item.clone());
                    match self.execute_block(body)? {
                        ControlFlow::Break => break,
                        ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
                        ControlFlow::Normal(_) | ControlFlow::Continue => {}
                    }
                }
                Ok(ControlFlow::Normal(Value::None))
            }
            Statement::Match { subject, arms } => {
                let value = Evaluator::new(self.interpreter, self.env).evaluate_match(subject, arms)?;
                Ok(ControlFlow::Normal(value))
            }
            Statement::Import { path, items, alias } => self.execute_import(path, items, alias.as_deref()),
            Statement::Module { name, body } => self.execute_module(name, body),
        }
    }

    /// Runs statements in the current environment. Blocks do not open a scope.
    pub fn execute_block(&self, statements: &[Statement]) -> Result<ControlFlow> {
        for stmt in statements {
            let flow = self.execute(stmt)?;
            if !flow.is_normal() {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Normal(Value::None))
    }

    fn execute_import(&self, path: &[String], items: &[String], alias: Option<&str>) -> Result<ControlFlow> {
        let name = path.join("::");
        let module = self.interpreter.import_module(&name)?;

        if let Some(alias) = alias {
            self.env.define(alias, module.clone());
        } else if items.is_empty() {
            let binding = path.last().cloned().unwrap_or_else(|| name.clone());
            self.env.define(binding, module.clone());
        }

        if !items.is_empty() {
            let Value::Module(module) = &module else {
                return runtime_error!("Cannot import items from {}", module.type_name());
            };
            for item in items {
                let Some(value) = module.export(item) else {
                    return runtime_error!("Module '{}' has no export '{}'", name, item);
                };
                self.env.define(item.clone(), value.clone());
            }
        }

        debug!("Imported module '{}'", name);
        Ok(ControlFlow::Normal(Value::None))
    }

    /// Runs the body in a child scope whose bindings become the module's exports.
    fn execute_module(&self, name: &str, body: &[Statement]) -> Result<ControlFlow> {
        let scope = Environment::with_parent(self.env);
        let flow = Executor::new(self.interpreter, &scope).execute_block(body)?;
        if !flow.is_normal() {
            return runtime_error!("'{}' is not allowed in module '{}'", flow.keyword(), name);
        }

        let exports: HashMap<String, Value> = scope.local_bindings().into_iter().collect();
        debug!("Declared module '{}' with {} exports", name, exports.len());
        let module = Module {
            name: name.to_string(),
            exports,
        };
        self.env.define(name, Value::Module(Arc::new(module)));
        Ok(ControlFlow::Normal(Value::None))
    }
}

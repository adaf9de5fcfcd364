use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::language::error::{Error, Result};
use super::value::Value;

/// A lexical scope. Clones share the same underlying bindings, so closures
/// and parallel tasks observe each other's writes.
#[derive(Clone, Default)]
pub struct Environment {
    scope: Arc<RwLock<Scope>>,
}

#[derive(Default)]
struct Scope {
    values: HashMap<String, Value>,
    parent: Option<Environment>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: &Environment) -> Self {
        Environment {
            scope: Arc::new(RwLock::new(Scope {
                values: HashMap::new(),
                parent: Some(parent.clone()),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Scope> {
        self.scope.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Scope> {
        self.scope.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn parent(&self) -> Option<Environment> {
        self.read().parent.clone()
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.write().values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        let mut current = self.clone();
        loop {
            let parent = {
                let scope = current.read();
                if let Some(value) = scope.values.get(name) {
                    return Ok(value.clone());
                }
                scope.parent.clone()
            };
            match parent {
                Some(parent) => current = parent,
                None => return Err(Error::runtime(format!("Undefined variable: {}", name))),
            }
        }
    }

    /// Rebinds the nearest existing binding of `name`.
    pub fn assign(&self, name: &str, value: Value) -> Result<()> {
        let mut current = self.clone();
        loop {
            let parent = {
                let mut scope = current.write();
                if let Some(slot) = scope.values.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
                scope.parent.clone()
            };
            match parent {
                Some(parent) => current = parent,
                None => return Err(Error::runtime(format!("Undefined variable: {}", name))),
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.read().values.contains_key(name)
    }

    /// Bindings made directly in this scope, sorted by name.
    pub fn local_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<(String, Value)> = self
            .read()
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    pub fn clear(&self) {
        self.write().values.clear();
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Arc::ptr_eq(&self.scope, &other.scope)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let scope = self.read();
        let mut names: Vec<&String> = scope.values.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("has_parent", &scope.parent.is_some())
            .finish()
    }
}

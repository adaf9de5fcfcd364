use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use log::{debug, trace};
use crate::language::error::{Error, Result};
use crate::language::interpreter::value::{Module, Value};
use super::linalg;

pub type ModuleLoader = dyn Fn() -> Result<Module> + Send + Sync;

/// Named native modules, loaded at most once each.
pub struct ModuleRegistry {
    loaders: RwLock<HashMap<String, Arc<ModuleLoader>>>,
    loaded: Mutex<HashMap<String, Value>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry {
            loaders: RwLock::new(HashMap::new()),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("linalg", linalg::module);
        registry
    }

    pub fn register<F>(&self, name: &str, loader: F)
    where
        F: Fn() -> Result<Module> + Send + Sync + 'static,
    {
        let mut loaders = self.loaders.write().unwrap_or_else(PoisonError::into_inner);
        if loaders.insert(name.to_string(), Arc::new(loader)).is_some() {
            debug!("Replacing loader for module '{}'", name);
        }
    }

    /// Returns the cached module or runs its loader. Loaders must not import
    /// other modules through the same registry.
    pub fn import(&self, name: &str) -> Result<Value> {
        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(module) = loaded.get(name) {
            trace!("Module '{}' served from cache", name);
            return Ok(module.clone());
        }

        let loader = self
            .loaders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| Error::runtime(format!("Unknown module: {}", name)))?;

        debug!("Loading module '{}'", name);
        let module = Value::Module(Arc::new(loader()?));
        loaded.insert(name.to_string(), module.clone());
        Ok(module)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }

    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .loaders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ModuleRegistry").field("available", &self.available()).finish()
    }
}

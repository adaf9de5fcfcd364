use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use crate::language::ast::{FunctionDeclaration, Lambda};
use crate::language::error::Result;
use super::Interpreter;
use super::environment::Environment;

pub type NativeFn = dyn Fn(&Interpreter, Vec<Value>) -> Result<Value> + Send + Sync;

#[derive(Clone, Debug)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Array(Arc<Vec<Value>>),
    None,
    Function(Arc<Function>),
    External(External),
    Module(Arc<Module>),
}

pub enum Function {
    Declared {
        declaration: Arc<FunctionDeclaration>,
        closure: Environment,
    },
    Lambda {
        lambda: Arc<Lambda>,
        closure: Environment,
    },
    Native(NativeFunction),
}

#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub func: Arc<NativeFn>,
}

/// Opaque handle to a resource owned by a native module.
#[derive(Clone)]
pub struct External {
    type_tag: String,
    handle: Arc<dyn Any + Send + Sync>,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub exports: HashMap<String, Value>,
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Arc::new(elements))
    }

    pub fn native<F>(name: &str, func: F) -> Value
    where
        F: Fn(&Interpreter, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(Arc::new(Function::Native(NativeFunction {
            name: name.to_string(),
            func: Arc::new(func),
        })))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::None => false,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Function(_) | Value::External(_) | Value::Module(_) => true,
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Integer(_) => "i64".to_string(),
            Value::Float(_) => "f64".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Boolean(_) => "bool".to_string(),
            Value::Array(items) => match items.first() {
                Some(first) => format!("Array<{}>", first.type_name()),
                None => "Array<unknown>".to_string(),
            },
            Value::None => "None".to_string(),
            Value::Function(_) => "fn".to_string(),
            Value::External(external) => external.type_tag.clone(),
            Value::Module(module) => format!("module<{}>", module.name),
        }
    }

    /// Ordering used by `<`, `<=`, `>` and `>=`; `None` for incomparable kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::None, Value::None) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            (Value::External(a), Value::External(b)) => Arc::ptr_eq(&a.handle, &b.handle),
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{:.1}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::None => write!(f, "None"),
            Value::Function(function) => write!(f, "{:?}", function),
            Value::External(external) => write!(f, "<{}>", external.type_tag),
            Value::Module(module) => write!(f, "<module {}>", module.name),
        }
    }
}

impl Function {
    pub fn name(&self) -> Option<&str> {
        match self {
            Function::Declared { declaration, .. } => Some(&declaration.name),
            Function::Lambda { .. } => None,
            Function::Native(native) => Some(&native.name),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Function::Declared { declaration, .. } => write!(f, "<fn {}>", declaration.name),
            Function::Lambda { lambda, .. } => write!(f, "<lambda/{}>", lambda.params.len()),
            Function::Native(native) => write!(f, "<native fn {}>", native.name),
        }
    }
}

impl External {
    pub fn new<T: Any + Send + Sync>(type_tag: &str, value: T) -> Self {
        External {
            type_tag: type_tag.to_string(),
            handle: Arc::new(value),
        }
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.handle.downcast_ref::<T>()
    }
}

impl fmt::Debug for External {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "External<{}>", self.type_tag)
    }
}

impl Module {
    pub fn new(name: &str) -> Self {
        Module {
            name: name.to_string(),
            exports: HashMap::new(),
        }
    }

    pub fn with_export(mut self, name: &str, value: Value) -> Self {
        self.exports.insert(name.to_string(), value);
        self
    }

    pub fn export(&self, name: &str) -> Option<&Value> {
        self.exports.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_value_kind() {
        assert!(Value::Boolean(true).is_truthy());
        assert!(!Value::None.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Float(-0.5).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::array(vec![]).is_truthy());
        assert!(Value::array(vec![Value::None]).is_truthy());
        assert!(Value::Module(Arc::new(Module::new("m"))).is_truthy());
    }

    #[test]
    fn display_matches_print_format() {
        let nested = Value::array(vec![
            Value::Integer(1),
            Value::array(vec![Value::String("a".into()), Value::Boolean(false)]),
            Value::Float(2.0),
            Value::Float(0.25),
            Value::None,
        ]);
        assert_eq!(nested.to_string(), "[1, [a, false], 2.0, 0.25, None]");
    }

    #[test]
    fn numbers_compare_across_kinds() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_eq!(Value::Integer(1).compare(&Value::Float(1.5)), Some(Ordering::Less));
        assert_ne!(Value::Integer(1), Value::String("1".into()));
        assert_eq!(Value::String("a".into()).compare(&Value::Integer(1)), None);
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::array(vec![Value::Integer(1)]).type_name(), "Array<i64>");
        assert_eq!(Value::array(vec![]).type_name(), "Array<unknown>");
        assert_eq!(Value::External(External::new("Tensor", 5u8)).type_name(), "Tensor");
        assert_eq!(Value::Module(Arc::new(Module::new("linalg"))).type_name(), "module<linalg>");
    }

    #[test]
    fn external_handles_downcast_to_their_payload() {
        let handle = External::new("Counter", 41u32);
        assert_eq!(handle.downcast_ref::<u32>(), Some(&41));
        assert!(handle.downcast_ref::<String>().is_none());
    }
}

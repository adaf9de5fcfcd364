//! TONG: a small expression-oriented scripting language.
//!
//! Source text goes through [`tokenize`], [`parse`] and finally an
//! [`Interpreter`], which walks the resulting [`Program`] directly.
//!
//! ```
//! use tong_core::{Interpreter, parse};
//!
//! let program = parse("let x = 40 + 2").unwrap();
//! let interpreter = Interpreter::new();
//! interpreter.interpret(&program).unwrap();
//! ```

pub mod language;

pub use language::interpreter::builtin::ModuleRegistry;
pub use language::interpreter::control::ControlFlow;
pub use language::interpreter::environment::Environment;
pub use language::interpreter::output::{CapturedOutput, Output};
pub use language::interpreter::task_runner::{SequentialRunner, Task, TaskRunner, ThreadPoolRunner};
pub use language::interpreter::value::{External, Function, Module, Value};
pub use language::{Error, ErrorKind, Interpreter, InterpreterConfig, Program, Result, Token, TokenType, parse, tokenize};

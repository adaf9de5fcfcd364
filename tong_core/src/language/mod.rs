pub mod token;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod error;
pub mod interpreter;

pub use error::{Error, ErrorKind, Result};
pub use ast::Program;
pub use token::{Token, TokenType};
pub use lexer::{Lexer, tokenize};
pub use parser::parse;
pub use interpreter::{Interpreter, InterpreterConfig};

use std::fmt;
use derive_more::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    #[display("Parse")]
    Parser,
    #[display("Runtime")]
    Runtime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl Error {
    pub fn parser(message: impl Into<String>, line: usize, column: usize) -> Self {
        Error {
            kind: ErrorKind::Parser,
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::Runtime,
            message: message.into(),
            line: None,
            column: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.line, &self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{} error: {} (line {}, column {})", self.kind, self.message, line, column)
            }
            (Some(line), None) => {
                write!(f, "{} error: {} (line {})", self.kind, self.message, line)
            }
            _ => {
                write!(f, "{} error: {}", self.kind, self.message)
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

#[macro_export]
macro_rules! parser_error {
    ($msg:expr, $line:expr, $col:expr) => {
        Err($crate::language::error::Error::parser($msg, $line, $col))
    };
}

#[macro_export]
macro_rules! runtime_error {
    ($msg:expr) => {
        Err($crate::language::error::Error::runtime($msg))
    };
    ($fmt:expr, $($arg:tt)+) => {
        Err($crate::language::error::Error::runtime(format!($fmt, $($arg)+)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_carry_position() {
        let error = Error::parser("Expected ')'", 3, 14);
        assert_eq!(error.to_string(), "Parse error: Expected ')' (line 3, column 14)");
    }

    #[test]
    fn runtime_errors_have_no_position() {
        let result: Result<()> = runtime_error!("Undefined variable: {}", "x");
        let error = result.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Runtime);
        assert_eq!(error.to_string(), "Runtime error: Undefined variable: x");
    }
}

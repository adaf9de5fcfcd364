pub mod aggregate;
pub mod basic;
pub mod linalg;
pub mod module;

pub use module::ModuleRegistry;

use crate::language::error::{Error, Result};
use super::environment::Environment;
use super::value::Value;

/// Defines every global builtin in `globals`.
pub fn install(globals: &Environment) {
    basic::install(globals);
    aggregate::install(globals);
}

pub(crate) fn expect_args<const N: usize>(function: &str, args: Vec<Value>) -> Result<[Value; N]> {
    let given = args.len();
    args.try_into().map_err(|_| {
        Error::runtime(format!("{}() takes {} argument(s) but {} were given", function, N, given))
    })
}

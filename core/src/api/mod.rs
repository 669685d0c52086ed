//! Public API: build a [`CalcContext`], register arguments, constants and
//! functions, then compile formulas into one of the [`Calculation`]
//! implementations.
//!
//! | form | built by | runs |
//! |---|---|---|
//! | one-shot | [`CalcContext::evaluate`] | while parsing |
//! | [`Interpreter`] | [`CalcContext::create_interpreter`] | bytecode |
//! | [`Evaluator`] | [`CalcContext::create_evaluator`] | native code |
//! | [`Tabulator`] | [`CalcContext::create_tabulator`] | native loop nest |
//!
//! # Example
//!
//! ```
//! use calcjit_core::{CalcContext, stdlib};
//!
//! let mut context = CalcContext::new();
//! stdlib::import_builtins(&mut context).unwrap();
//! context.add_argument("x").unwrap();
//!
//! let calculation = context.create_calculation("max(x, 1) * pi").unwrap();
//! assert_eq!(calculation.evaluate(&[2.0]).unwrap(), 2.0 * std::f64::consts::PI);
//! ```

mod calculation;
mod context;
mod error;
mod interpreter;
mod options;

pub use calculation::Calculation;
pub use context::CalcContext;
pub use error::Error;
pub use interpreter::Interpreter;
pub use options::CalcOptions;

pub use crate::compiler::native::{Evaluator, Tabulator};
pub use crate::parser::Culture;

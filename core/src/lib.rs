//! Arithmetic expression engine: parsing, optimization, bytecode
//! interpretation, native compilation and tabulation of formulas over
//! named arguments, constants and overloaded functions.

pub mod api;
pub mod compiler;
pub mod ir;
pub mod optimizer;
pub mod parser;
pub mod stdlib;
pub mod symbols;
pub mod tabulation;
pub mod vm;

pub use api::{
    CalcContext, CalcOptions, Calculation, Culture, Error, Evaluator, Interpreter, Tabulator,
};
pub use optimizer::OptimizeModes;
pub use parser::{Span, SyntaxError, SyntaxErrorKind};
pub use symbols::{FunctionItem, RegistrationError};
pub use tabulation::{Range, RangeError, Table, TabulateTask};

//! calcjit - an embeddable arithmetic expression engine
//!
//! # Overview
//!
//! calcjit parses formulas such as `2x^2 + sin(y) / max(x, y, 1)` over
//! named arguments, constants and overloaded functions supplied by the host,
//! and evaluates them either once, through a bytecode interpreter, or as
//! native code compiled at runtime. Whole grids of argument values can be
//! tabulated in one call, synchronously or on a tokio runtime.
//!
//! # Quick Start
//!
//! ```
//! use calcjit::{CalcContext, Range, stdlib};
//!
//! let mut context = CalcContext::new();
//! stdlib::import_builtins(&mut context).unwrap();
//! context.add_argument("x").unwrap();
//!
//! // One-shot evaluation
//! assert_eq!(context.evaluate("2x + 1", &[3.0]).unwrap(), 7.0);
//!
//! // Compile once, call many times
//! let calculation = context.create_calculation("x^2").unwrap();
//! assert_eq!(calculation.evaluate(&[4.0]).unwrap(), 16.0);
//!
//! // Tabulate over a range of argument values
//! let table = calculation.tabulate(&[Range::new(0.0, 3.0, 1.0).unwrap()]).unwrap();
//! assert_eq!(table.as_row().unwrap(), &[0.0, 1.0, 4.0, 9.0]);
//! ```
//!
//! # Host Functions
//!
//! ```
//! use calcjit::{CalcContext, FunctionItem};
//!
//! extern "C" fn half(x: f64) -> f64 {
//!     x / 2.0
//! }
//!
//! let mut context = CalcContext::new();
//! context.add_function("half", FunctionItem::unary(half)).unwrap();
//! context
//!     .add_function("sum", FunctionItem::variadic(0, |_, tail| tail.iter().sum()))
//!     .unwrap();
//!
//! assert_eq!(context.evaluate("half(sum(1, 2, 3))", &[]).unwrap(), 3.0);
//! ```

// Error rendering utilities
pub mod error_renderer;
pub use error_renderer::{CharSet, RenderConfig, render_error, render_error_to};

// Re-export public API from calcjit_core
pub use calcjit_core::api::{
    CalcContext, CalcOptions, Calculation, Culture, Error, Evaluator, Interpreter, Tabulator,
};
pub use calcjit_core::optimizer::OptimizeModes;
pub use calcjit_core::parser::{Span, SyntaxError, SyntaxErrorKind};
pub use calcjit_core::symbols::{FunctionItem, RegistrationError};
pub use calcjit_core::tabulation::{Range, RangeError, Table, TabulateTask};

pub use calcjit_core::stdlib;

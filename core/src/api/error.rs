//! Public error type for every calculation operation.
//!
//! Syntax and registration problems surface while building a calculation;
//! everything else is raised by the call surface of an already built one.

use thiserror::Error;

use crate::compiler::native::NativeError;
use crate::parser::SyntaxError;
use crate::symbols::RegistrationError;
use crate::tabulation::RangeError;

#[derive(Debug, Error)]
pub enum Error {
    /// The formula could not be parsed. Carries the position and length of
    /// the offending text.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("expected {expected} argument(s), got {got}")]
    ArgumentCount { expected: usize, got: usize },

    #[error("expected {expected} range(s), got {got}")]
    RangeCount { expected: usize, got: usize },

    #[error("table shape does not match the ranges")]
    TableShape,

    #[error("a calculation without arguments cannot be tabulated")]
    NothingToTabulate,

    /// Checked mode only: a result was NaN or infinite.
    #[error("result is not a finite number: {0}")]
    NotFinite(f64),

    #[error(transparent)]
    Native(#[from] NativeError),

    #[error("tabulation was cancelled")]
    TaskCancelled,

    #[error("tabulation result was already taken")]
    TaskConsumed,

    #[error("no tokio runtime is available to run the tabulation")]
    NoRuntime,
}

impl Error {
    /// The syntax error, when this is one.
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            Error::Syntax(error) => Some(error),
            _ => None,
        }
    }
}

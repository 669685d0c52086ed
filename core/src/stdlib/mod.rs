//! Builtin constants and functions.
//!
//! Nothing is registered by default; call [`import_builtins`] on a context
//! to make the usual math vocabulary available.

pub mod math;

pub use math::{register_math_constants, register_math_functions};

use crate::api::CalcContext;
use crate::symbols::RegistrationError;

/// Registers every builtin constant and function in `context`.
///
/// Fails if any builtin name is already taken by a conflicting entry.
pub fn import_builtins(context: &mut CalcContext) -> Result<(), RegistrationError> {
    register_math_constants(context.constants_mut())?;
    register_math_functions(context.functions_mut())
}

//! Stack machine that runs compiled [`Program`]s, plus the one-shot
//! evaluator that computes a result straight from the IR stream.

mod code;
mod quick;
#[allow(clippy::module_inception)]
mod vm;

pub use code::{CallDescriptor, Instruction, Program};
pub use quick::QuickEvaluator;
pub use vm::execute;

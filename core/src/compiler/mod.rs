//! Backends that turn an IR stream into something executable.

pub mod bytecode;
pub mod native;

pub use bytecode::BytecodeCompiler;

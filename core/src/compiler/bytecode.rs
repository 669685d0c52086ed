//! Bytecode compiler: an IR sink producing a [`Program`] for the VM.

use hashbrown::HashMap;
use tracing::debug;

use crate::ir::{IrEvent, IrSink, Operator};
use crate::vm::{CallDescriptor, Instruction, Program};

/// Bytecode compiler fed by the parser (or the optimizer).
///
/// It tracks the operand stack precisely so the program can be run over a
/// scratch buffer sized exactly once.
#[derive(Debug, Default)]
pub struct BytecodeCompiler {
    instructions: Vec<Instruction>,

    /// Constant pool, deduplicated by bit pattern so `0.0` and `-0.0` stay
    /// distinct and NaN payloads survive.
    constants: Vec<f64>,
    constant_index: HashMap<u64, u32>,

    calls: Vec<CallDescriptor>,

    current_stack_depth: usize,
    max_stack_size: usize,
}

impl BytecodeCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finishes compilation. The stream must have been complete.
    pub fn finish(self, source: &str, arg_count: usize) -> Program {
        debug_assert_eq!(self.current_stack_depth, 1);
        debug_assert_eq!(self.instructions.last(), Some(&Instruction::Return));
        debug!(
            source,
            instructions = self.instructions.len(),
            constants = self.constants.len(),
            calls = self.calls.len(),
            max_stack = self.max_stack_size,
            "compiled bytecode"
        );
        Program {
            instructions: self.instructions,
            constants: self.constants,
            calls: self.calls,
            max_stack_size: self.max_stack_size,
            arg_count,
            source: source.to_owned(),
        }
    }

    fn add_constant(&mut self, value: f64) -> u32 {
        let next = self.constants.len() as u32;
        let index = *self.constant_index.entry(value.to_bits()).or_insert(next);
        if index == next {
            self.constants.push(value);
        }
        index
    }

    // === Stack Management ===

    /// Push a value onto the stack (increases depth by 1).
    fn push_stack(&mut self) {
        self.current_stack_depth += 1;
        if self.current_stack_depth > self.max_stack_size {
            self.max_stack_size = self.current_stack_depth;
        }
    }

    /// Pop N values from the stack.
    fn pop_stack_n(&mut self, n: usize) {
        debug_assert!(
            self.current_stack_depth >= n,
            "Stack underflow: trying to pop {} but depth is {}",
            n,
            self.current_stack_depth
        );
        self.current_stack_depth -= n;
    }
}

impl IrSink for BytecodeCompiler {
    fn emit(&mut self, event: IrEvent) {
        match event {
            IrEvent::Constant(value) => {
                let index = self.add_constant(value);
                self.instructions.push(Instruction::Const(index));
                self.push_stack();
            }
            IrEvent::Argument(index) => {
                self.instructions.push(Instruction::Arg(index as u32));
                self.push_stack();
            }
            IrEvent::Operator(op) => {
                let instruction = match op {
                    Operator::Neg => Instruction::Neg,
                    Operator::Add => Instruction::Add,
                    Operator::Sub => Instruction::Sub,
                    Operator::Mul => Instruction::Mul,
                    Operator::Div => Instruction::Div,
                    Operator::Rem => Instruction::Rem,
                    Operator::Pow => Instruction::Pow,
                };
                self.instructions.push(instruction);
                if !op.is_unary() {
                    self.pop_stack_n(1);
                }
            }
            IrEvent::Invoke { function, args } => {
                let index = self.calls.len() as u32;
                self.calls.push(CallDescriptor { function, args });
                self.instructions.push(Instruction::Call(index));
                self.pop_stack_n(args);
                self.push_stack();
            }
            IrEvent::BeginCall | IrEvent::Separator => {}
            IrEvent::End => self.instructions.push(Instruction::Return),
        }
    }
}

#[cfg(test)]
#[path = "bytecode_test.rs"]
mod bytecode_test;

use super::{Instruction, Program};
use crate::ir::{pow, rem};

/// Runs `program` over `args` using `stack` as operand storage.
///
/// `stack` must hold at least `program.max_stack_size` slots and `args`
/// exactly `program.arg_count` values; both are checked by the callers.
pub fn execute(program: &Program, args: &[f64], stack: &mut [f64]) -> f64 {
    debug_assert!(stack.len() >= program.max_stack_size);
    debug_assert_eq!(args.len(), program.arg_count);

    let mut sp = 0usize;
    for instruction in &program.instructions {
        match *instruction {
            Instruction::Const(index) => {
                stack[sp] = program.constants[index as usize];
                sp += 1;
            }
            Instruction::Arg(index) => {
                stack[sp] = args[index as usize];
                sp += 1;
            }
            Instruction::Neg => stack[sp - 1] = -stack[sp - 1],
            Instruction::Add => {
                sp -= 1;
                stack[sp - 1] += stack[sp];
            }
            Instruction::Sub => {
                sp -= 1;
                stack[sp - 1] -= stack[sp];
            }
            Instruction::Mul => {
                sp -= 1;
                stack[sp - 1] *= stack[sp];
            }
            Instruction::Div => {
                sp -= 1;
                stack[sp - 1] /= stack[sp];
            }
            Instruction::Rem => {
                sp -= 1;
                stack[sp - 1] = rem(stack[sp - 1], stack[sp]);
            }
            Instruction::Pow => {
                sp -= 1;
                stack[sp - 1] = pow(stack[sp - 1], stack[sp]);
            }
            Instruction::Call(index) => {
                let call = &program.calls[index as usize];
                // Arguments sit contiguously on the stack in source order.
                let base = sp - call.args;
                stack[base] = call.function.call(&stack[base..sp]);
                sp = base + 1;
            }
            Instruction::Return => break,
        }
    }

    debug_assert_eq!(sp, 1, "stack should hold exactly the result");
    stack[0]
}

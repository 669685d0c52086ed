use std::fmt;

use crate::symbols::FunctionItem;

/// Bytecode instruction. Operands index into the program's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Push `constants[i]`.
    Const(u32),
    /// Push `args[i]`.
    Arg(u32),
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    /// Replace the top `calls[i].args` slots with the call's result.
    Call(u32),
    Return,
}

/// A resolved call site.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    pub function: FunctionItem,
    pub args: usize,
}

/// Compiled form of one expression. Self-contained: it owns every constant
/// and call target it needs.
#[derive(Debug, Clone)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub constants: Vec<f64>,
    pub calls: Vec<CallDescriptor>,
    /// Peak operand stack depth.
    pub max_stack_size: usize,
    pub arg_count: usize,
    pub source: String,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; {}", self.source)?;
        writeln!(
            f,
            "; args: {}, max stack: {}",
            self.arg_count, self.max_stack_size
        )?;
        for (offset, instruction) in self.instructions.iter().enumerate() {
            write!(f, "{offset:04}  ")?;
            match *instruction {
                Instruction::Const(index) => {
                    let value = self.constants.get(index as usize).copied().unwrap_or(f64::NAN);
                    writeln!(f, "const #{index} ({value})")?
                }
                Instruction::Arg(index) => writeln!(f, "arg   ${index}")?,
                Instruction::Neg => writeln!(f, "neg")?,
                Instruction::Add => writeln!(f, "add")?,
                Instruction::Sub => writeln!(f, "sub")?,
                Instruction::Mul => writeln!(f, "mul")?,
                Instruction::Div => writeln!(f, "div")?,
                Instruction::Rem => writeln!(f, "rem")?,
                Instruction::Pow => writeln!(f, "pow")?,
                Instruction::Call(index) => match self.calls.get(index as usize) {
                    Some(call) => {
                        let tail = if call.function.is_variadic() { "+" } else { "" };
                        writeln!(
                            f,
                            "call  @{index} argc={} [{}{tail}]",
                            call.args,
                            call.function.fixed_count()
                        )?
                    }
                    None => writeln!(f, "call  @{index} <missing>")?,
                },
                Instruction::Return => writeln!(f, "ret")?,
            }
        }
        Ok(())
    }
}

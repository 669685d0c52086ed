use smallvec::SmallVec;

use crate::ir::{IrEvent, IrSink, Operator};

/// Evaluates the IR stream as it arrives; used for one-shot evaluation
/// where compiling first would be wasted work.
pub struct QuickEvaluator<'a> {
    args: &'a [f64],
    stack: SmallVec<[f64; 16]>,
}

impl<'a> QuickEvaluator<'a> {
    pub fn new(args: &'a [f64]) -> Self {
        Self {
            args,
            stack: SmallVec::new(),
        }
    }

    /// The value of a complete expression.
    pub fn result(&self) -> Option<f64> {
        match self.stack.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }
}

impl IrSink for QuickEvaluator<'_> {
    fn emit(&mut self, event: IrEvent) {
        match event {
            IrEvent::Constant(value) => self.stack.push(value),
            IrEvent::Argument(index) => self.stack.push(self.args[index]),
            IrEvent::Operator(Operator::Neg) => {
                if let Some(top) = self.stack.last_mut() {
                    *top = -*top;
                }
            }
            IrEvent::Operator(op) => {
                if let (Some(rhs), Some(lhs)) = (self.stack.pop(), self.stack.last_mut()) {
                    *lhs = op.apply(*lhs, rhs);
                }
            }
            IrEvent::Invoke { function, args } => {
                let base = self.stack.len() - args;
                let value = function.call(&self.stack[base..]);
                self.stack.truncate(base);
                self.stack.push(value);
            }
            IrEvent::BeginCall | IrEvent::Separator | IrEvent::End => {}
        }
    }
}

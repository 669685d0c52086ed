//! IR-to-IR filter that folds what it can before the stream reaches a
//! backend.
//!
//! The optimizer holds back a short window of events (constants, argument
//! loads, call frames) and rewrites the tail of that window when an operator
//! or call arrives whose operands are all known. Anything it cannot fold
//! flushes the window downstream unchanged, so the output is always a valid
//! stream in the original order.

use bitflags::bitflags;
use smallvec::SmallVec;
use tracing::trace;

use crate::ir::{IrEvent, IrSink, Operator};
use crate::symbols::FunctionItem;

bitflags! {
    /// Optimization passes applied between the parser and a backend.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct OptimizeModes: u8 {
        /// `2 * 3` becomes `6`, `-(1)` becomes `-1`.
        const CONSTANT_FOLDING = 1;
        /// Calls whose arguments are all constants are evaluated once, at
        /// compile time. Only safe for pure functions: the callee runs while
        /// compiling, so a panicking closure panics out of `create_*` or
        /// `evaluate` instead of returning an error.
        const FUNCTION_FOLDING = 1 << 1;
        /// `x ^ 2` becomes `x * x`. Higher powers are left to `pow`, since
        /// repeated multiplication rounds differently.
        const POW_EXPANSION = 1 << 2;
        const ALL = Self::CONSTANT_FOLDING.bits()
            | Self::FUNCTION_FOLDING.bits()
            | Self::POW_EXPANSION.bits();
    }
}

impl OptimizeModes {
    pub const NONE: OptimizeModes = OptimizeModes::empty();
}

impl Default for OptimizeModes {
    fn default() -> Self {
        OptimizeModes::CONSTANT_FOLDING
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Constant(f64),
    Argument(usize),
    BeginCall,
    Separator,
}

pub struct Optimizer<S: IrSink> {
    modes: OptimizeModes,
    pending: SmallVec<[Pending; 16]>,
    folds: usize,
    sink: S,
}

impl<S: IrSink> Optimizer<S> {
    pub fn new(modes: OptimizeModes, sink: S) -> Self {
        Self {
            modes,
            pending: SmallVec::new(),
            folds: 0,
            sink,
        }
    }

    /// Number of rewrites performed so far.
    pub fn folds(&self) -> usize {
        self.folds
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    fn flush(&mut self) {
        for pending in self.pending.drain(..) {
            self.sink.emit(match pending {
                Pending::Constant(value) => IrEvent::Constant(value),
                Pending::Argument(index) => IrEvent::Argument(index),
                Pending::BeginCall => IrEvent::BeginCall,
                Pending::Separator => IrEvent::Separator,
            });
        }
    }

    fn forward(&mut self, event: IrEvent) {
        self.flush();
        self.sink.emit(event);
    }

    fn fold_unary(&mut self, op: Operator) -> bool {
        if !self.modes.contains(OptimizeModes::CONSTANT_FOLDING) {
            return false;
        }
        match self.pending.last_mut() {
            Some(Pending::Constant(value)) => {
                *value = op.apply(*value, 0.0);
                true
            }
            _ => false,
        }
    }

    fn fold_binary(&mut self, op: Operator) -> bool {
        let len = self.pending.len();
        if len < 2 {
            return false;
        }
        match (self.pending[len - 2], self.pending[len - 1]) {
            (Pending::Constant(lhs), Pending::Constant(rhs))
                if self.modes.contains(OptimizeModes::CONSTANT_FOLDING) =>
            {
                let value = op.apply(lhs, rhs);
                trace!(?op, lhs, rhs, value, "folded operator");
                self.pending.truncate(len - 2);
                self.pending.push(Pending::Constant(value));
                true
            }
            // `x * x` is the correctly rounded square, same as `powf(x, 2)`.
            (Pending::Argument(index), Pending::Constant(exponent))
                if op == Operator::Pow
                    && self.modes.contains(OptimizeModes::POW_EXPANSION)
                    && exponent == 2.0 =>
            {
                self.pending.truncate(len - 2);
                self.flush();
                self.sink.emit(IrEvent::Argument(index));
                self.sink.emit(IrEvent::Argument(index));
                self.sink.emit(IrEvent::Operator(Operator::Mul));
                trace!(index, "expanded square");
                true
            }
            _ => false,
        }
    }

    /// Folds `BeginCall C (Separator C)* Invoke` when every argument is a
    /// constant.
    fn fold_call(&mut self, function: &FunctionItem, args: usize) -> bool {
        if !self.modes.contains(OptimizeModes::FUNCTION_FOLDING) {
            return false;
        }
        let frame = if args == 0 { 1 } else { 2 * args };
        let Some(start) = self.pending.len().checked_sub(frame) else {
            return false;
        };
        let window = &self.pending[start..];
        if window[0] != Pending::BeginCall {
            return false;
        }

        let mut values = SmallVec::<[f64; 8]>::with_capacity(args);
        for (offset, pending) in window[1..].iter().enumerate() {
            match (offset % 2, pending) {
                (0, Pending::Constant(value)) => values.push(*value),
                (1, Pending::Separator) => {}
                _ => return false,
            }
        }

        let value = function.call(&values);
        trace!(args, value, "folded call");
        self.pending.truncate(start);
        self.pending.push(Pending::Constant(value));
        true
    }
}

impl<S: IrSink> IrSink for Optimizer<S> {
    fn emit(&mut self, event: IrEvent) {
        if self.modes.is_empty() {
            self.sink.emit(event);
            return;
        }

        let folded = match &event {
            IrEvent::Constant(value) => {
                self.pending.push(Pending::Constant(*value));
                return;
            }
            IrEvent::Argument(index) => {
                self.pending.push(Pending::Argument(*index));
                return;
            }
            IrEvent::BeginCall | IrEvent::Separator
                if self.modes.contains(OptimizeModes::FUNCTION_FOLDING) =>
            {
                self.pending.push(if matches!(event, IrEvent::BeginCall) {
                    Pending::BeginCall
                } else {
                    Pending::Separator
                });
                return;
            }
            IrEvent::Operator(op) if op.is_unary() => self.fold_unary(*op),
            IrEvent::Operator(op) => self.fold_binary(*op),
            IrEvent::Invoke { function, args } => self.fold_call(function, *args),
            IrEvent::BeginCall | IrEvent::Separator | IrEvent::End => false,
        };

        if folded {
            self.folds += 1;
        } else {
            self.forward(event);
        }
    }
}

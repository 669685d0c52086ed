//! The event protocol between the parser and the backends.
//!
//! The parser never builds a tree: it emits a postfix stream of events into
//! an [`IrSink`]. Every backend (optimizer, bytecode compiler, one-shot
//! evaluator, native code generator) is such a sink, so one parse drives
//! exactly one backend.

mod buffer;

pub use buffer::IrBuffer;

use std::fmt;

use crate::symbols::FunctionItem;

/// Arithmetic operators, ordered by nothing in particular.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl Operator {
    /// Binary operator for a source character.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '+' => Operator::Add,
            '-' => Operator::Sub,
            '*' => Operator::Mul,
            '/' => Operator::Div,
            '%' => Operator::Rem,
            '^' => Operator::Pow,
            _ => return None,
        })
    }

    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 0,
            Operator::Mul | Operator::Div | Operator::Rem => 1,
            Operator::Neg => 2,
            Operator::Pow => 3,
        }
    }

    pub fn is_unary(self) -> bool {
        self == Operator::Neg
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Neg => '~',
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
            Operator::Rem => '%',
            Operator::Pow => '^',
        }
    }

    /// Runtime semantics shared by every backend. `rhs` is ignored for
    /// `Neg`.
    #[inline]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operator::Neg => -lhs,
            Operator::Add => lhs + rhs,
            Operator::Sub => lhs - rhs,
            Operator::Mul => lhs * rhs,
            Operator::Div => lhs / rhs,
            Operator::Rem => rem(lhs, rhs),
            Operator::Pow => pow(lhs, rhs),
        }
    }
}

/// `%` as IEEE remainder truncated toward zero (sign of the dividend).
#[inline]
pub fn rem(lhs: f64, rhs: f64) -> f64 {
    lhs % rhs
}

#[inline]
pub fn pow(base: f64, exponent: f64) -> f64 {
    base.powf(exponent)
}

/// One step of the postfix stream.
///
/// A call is framed as `BeginCall, arg₀, Separator, arg₁, …, Invoke`;
/// each argument is itself a complete postfix sub-stream.
#[derive(Debug, Clone)]
pub enum IrEvent {
    Constant(f64),
    Argument(usize),
    Operator(Operator),
    BeginCall,
    Separator,
    Invoke { function: FunctionItem, args: usize },
    End,
}

impl fmt::Display for IrEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrEvent::Constant(value) => write!(f, "{value}"),
            IrEvent::Argument(index) => write!(f, "${index}"),
            IrEvent::Operator(op) => write!(f, "{}", op.symbol()),
            IrEvent::BeginCall => f.write_str("("),
            IrEvent::Separator => f.write_str(","),
            IrEvent::Invoke { function, args } => {
                let tail = if function.is_variadic() { "+" } else { "" };
                write!(f, ")call/{args}[{}{tail}]", function.fixed_count())
            }
            IrEvent::End => f.write_str("end"),
        }
    }
}

/// Consumer of IR events.
pub trait IrSink {
    fn emit(&mut self, event: IrEvent);
}

impl<S: IrSink + ?Sized> IrSink for &mut S {
    fn emit(&mut self, event: IrEvent) {
        (**self).emit(event)
    }
}

impl IrSink for Vec<IrEvent> {
    fn emit(&mut self, event: IrEvent) {
        self.push(event);
    }
}

/// Drops everything; parsing into it is validation only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl IrSink for NullSink {
    fn emit(&mut self, _event: IrEvent) {}
}

/// Renders a stream as space separated events, mostly for tests and
/// debug logging.
pub fn render(events: &[IrEvent]) -> String {
    events
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

use std::fmt;
use std::sync::{Mutex, PoisonError, TryLockError};

use tracing::trace;

use super::Error;
use crate::tabulation::{self, Range, Table, check_range_count};
use crate::vm::{Program, execute};

/// A formula compiled to bytecode, reusable for any number of calls.
///
/// The interpreter owns one scratch stack sized for the program. Methods
/// taking `&mut self` use it directly. The shared (`&self`) methods try to
/// lock it and, when another thread holds it, run on a private stack of
/// the same size instead of waiting.
pub struct Interpreter {
    program: Program,
    scratch: Mutex<Vec<f64>>,
    checked: bool,
}

impl Interpreter {
    pub(crate) fn new(program: Program, checked: bool) -> Self {
        let scratch = vec![0.0; program.max_stack_size];
        Self {
            program,
            scratch: Mutex::new(scratch),
            checked,
        }
    }

    pub fn source(&self) -> &str {
        &self.program.source
    }

    pub fn arg_count(&self) -> usize {
        self.program.arg_count
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    fn check_args(&self, args: &[f64]) -> Result<(), Error> {
        if args.len() != self.program.arg_count {
            return Err(Error::ArgumentCount {
                expected: self.program.arg_count,
                got: args.len(),
            });
        }
        Ok(())
    }

    fn run(&self, stack: &mut [f64], args: &[f64]) -> Result<f64, Error> {
        self.runner().run(stack, args)
    }

    fn runner(&self) -> Runner<'_> {
        Runner {
            program: &self.program,
            checked: self.checked,
        }
    }

    /// Runs `f` on the shared stack, or on a private one when the shared
    /// stack is busy.
    fn with_scratch<T>(&self, f: impl FnOnce(&mut [f64]) -> T) -> T {
        match self.scratch.try_lock() {
            Ok(mut stack) => f(&mut stack),
            // A panic in a bound function leaves nothing to repair.
            Err(TryLockError::Poisoned(poisoned)) => f(&mut poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                trace!(size = self.program.max_stack_size, "scratch stack busy");
                let mut private = vec![0.0; self.program.max_stack_size];
                f(&mut private)
            }
        }
    }

    pub fn evaluate(&self, args: &[f64]) -> Result<f64, Error> {
        self.check_args(args)?;
        self.with_scratch(|stack| self.run(stack, args))
    }

    pub fn tabulate(&self, ranges: &[Range]) -> Result<Table, Error> {
        check_range_count(ranges, self.program.arg_count)?;
        self.with_scratch(|stack| tabulation::tabulate(ranges, |args| self.run(stack, args)))
    }

    pub fn tabulate_into(&self, table: &mut Table, ranges: &[Range]) -> Result<(), Error> {
        check_range_count(ranges, self.program.arg_count)?;
        self.with_scratch(|stack| {
            tabulation::tabulate_into(table, ranges, |args| self.run(stack, args))
        })
    }

    /// Like [`Interpreter::evaluate`], without any locking.
    pub fn evaluate_mut(&mut self, args: &[f64]) -> Result<f64, Error> {
        self.check_args(args)?;
        let (this, stack) = self.split();
        this.run(stack, args)
    }

    pub fn tabulate_mut(&mut self, ranges: &[Range]) -> Result<Table, Error> {
        check_range_count(ranges, self.program.arg_count)?;
        let (this, stack) = self.split();
        tabulation::tabulate(ranges, |args| this.run(stack, args))
    }

    pub fn tabulate_into_mut(&mut self, table: &mut Table, ranges: &[Range]) -> Result<(), Error> {
        check_range_count(ranges, self.program.arg_count)?;
        let (this, stack) = self.split();
        tabulation::tabulate_into(table, ranges, |args| this.run(stack, args))
    }

    fn split(&mut self) -> (Runner<'_>, &mut [f64]) {
        let stack: &mut [f64] = self
            .scratch
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        (
            Runner {
                program: &self.program,
                checked: self.checked,
            },
            stack,
        )
    }
}

/// The read-only half of an exclusively borrowed interpreter.
struct Runner<'a> {
    program: &'a Program,
    checked: bool,
}

impl Runner<'_> {
    fn run(&self, stack: &mut [f64], args: &[f64]) -> Result<f64, Error> {
        let value = execute(self.program, args, stack);
        if self.checked && !value.is_finite() {
            return Err(Error::NotFinite(value));
        }
        Ok(value)
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("source", &self.program.source)
            .field("arg_count", &self.program.arg_count)
            .field("max_stack_size", &self.program.max_stack_size)
            .field("checked", &self.checked)
            .finish()
    }
}

#[cfg(test)]
#[path = "interpreter_test.rs"]
mod interpreter_test;

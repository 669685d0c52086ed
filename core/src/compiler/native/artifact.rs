use std::ffi::c_void;
use std::fmt;
use std::mem::ManuallyDrop;
use std::sync::Arc;

use cranelift_jit::JITModule;
use smallvec::SmallVec;
use static_assertions::{assert_eq_size, assert_impl_all};

use super::runtime::run_native;
use crate::api::Error;
use crate::symbols::BoundFn;
use crate::tabulation::{self, Range, Table};

/// One tabulation dimension as native code reads it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LoopFrame {
    pub begin: f64,
    pub step: f64,
    pub count: i64,
}

assert_eq_size!(LoopFrame, [u8; 24]);

impl LoopFrame {
    fn single(value: f64) -> Self {
        Self {
            begin: value,
            step: 0.0,
            count: 1,
        }
    }
}

/// Owns the executable memory of one artifact.
pub(super) struct CodeMemory {
    module: ManuallyDrop<JITModule>,
}

// The module is never touched again after finalization; generated code
// reads only its parameters and the immutable capture table.
unsafe impl Send for CodeMemory {}
unsafe impl Sync for CodeMemory {}

impl CodeMemory {
    fn new(module: JITModule) -> Self {
        Self {
            module: ManuallyDrop::new(module),
        }
    }
}

impl Drop for CodeMemory {
    fn drop(&mut self) {
        // SAFETY: the owning artifact drops its entry pointer together with
        // this value, so no caller can still reach the code.
        unsafe { ManuallyDrop::take(&mut self.module).free_memory() };
    }
}

type Captures = Box<[Arc<BoundFn>]>;

#[derive(Clone, Copy)]
enum Entry {
    Nullary(unsafe extern "C" fn(*const c_void) -> f64),
    Unary(unsafe extern "C" fn(*const c_void, f64) -> f64),
    Binary(unsafe extern "C" fn(*const c_void, f64, f64) -> f64),
    Vector(unsafe extern "C" fn(*const c_void, *const f64) -> f64),
}

/// A formula compiled to a native function of its arguments.
pub struct Evaluator {
    source: String,
    arg_count: usize,
    checked: bool,
    entry: Entry,
    pub(crate) captures: Captures,
    // Dropped last: frees the code `entry` points into.
    _code: CodeMemory,
}

assert_impl_all!(Evaluator: Send, Sync);

impl Evaluator {
    pub(super) fn new(
        source: &str,
        arg_count: usize,
        checked: bool,
        code: *const u8,
        captures: Captures,
        module: JITModule,
    ) -> Self {
        // SAFETY: `code` was generated with exactly the signature selected
        // by `arg_count`.
        let entry = unsafe {
            match arg_count {
                0 => Entry::Nullary(std::mem::transmute::<*const u8, _>(code)),
                1 => Entry::Unary(std::mem::transmute::<*const u8, _>(code)),
                2 => Entry::Binary(std::mem::transmute::<*const u8, _>(code)),
                _ => Entry::Vector(std::mem::transmute::<*const u8, _>(code)),
            }
        };
        Self {
            source: source.to_string(),
            arg_count,
            checked,
            entry,
            captures,
            _code: CodeMemory::new(module),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn arg_count(&self) -> usize {
        self.arg_count
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn evaluate(&self, args: &[f64]) -> Result<f64, Error> {
        if args.len() != self.arg_count {
            return Err(Error::ArgumentCount {
                expected: self.arg_count,
                got: args.len(),
            });
        }
        let captures = self.captures.as_ptr().cast::<c_void>();
        // SAFETY: the argument count matches the entry signature and the
        // capture table outlives the call.
        run_native(|| unsafe {
            match self.entry {
                Entry::Nullary(f) => f(captures),
                Entry::Unary(f) => f(captures, args[0]),
                Entry::Binary(f) => f(captures, args[0], args[1]),
                Entry::Vector(f) => f(captures, args.as_ptr()),
            }
        })
    }

    pub fn tabulate(&self, ranges: &[Range]) -> Result<Table, Error> {
        tabulation::check_range_count(ranges, self.arg_count)?;
        tabulation::tabulate(ranges, |args| self.evaluate(args))
    }

    pub fn tabulate_into(&self, table: &mut Table, ranges: &[Range]) -> Result<(), Error> {
        tabulation::check_range_count(ranges, self.arg_count)?;
        tabulation::tabulate_into(table, ranges, |args| self.evaluate(args))
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("source", &self.source)
            .field("arg_count", &self.arg_count)
            .field("checked", &self.checked)
            .field("captures", &self.captures.len())
            .finish()
    }
}

type TabulateEntry = unsafe extern "C" fn(*const c_void, *const LoopFrame, *const *mut f64);

/// A formula compiled to a native loop nest over its arguments.
pub struct Tabulator {
    source: String,
    arg_count: usize,
    checked: bool,
    entry: TabulateEntry,
    captures: Captures,
    _code: CodeMemory,
}

assert_impl_all!(Tabulator: Send, Sync);

impl Tabulator {
    pub(super) fn new(
        source: &str,
        arg_count: usize,
        checked: bool,
        code: *const u8,
        captures: Captures,
        module: JITModule,
    ) -> Self {
        // SAFETY: `code` was generated with the tabulator signature.
        let entry = unsafe { std::mem::transmute::<*const u8, TabulateEntry>(code) };
        Self {
            source: source.to_string(),
            arg_count,
            checked,
            entry,
            captures,
            _code: CodeMemory::new(module),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn arg_count(&self) -> usize {
        self.arg_count
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Runs the loop nest over `frames`, writing into `rows`.
    ///
    /// Callers guarantee one frame per argument and one row pointer per
    /// innermost row, each row holding the innermost count of cells.
    fn run(&self, frames: &[LoopFrame], rows: &[*mut f64]) -> Result<(), Error> {
        debug_assert_eq!(frames.len(), self.arg_count);
        let captures = self.captures.as_ptr().cast::<c_void>();
        run_native(|| unsafe { (self.entry)(captures, frames.as_ptr(), rows.as_ptr()) })
    }

    /// Evaluates at a single point by running every loop once.
    pub fn evaluate(&self, args: &[f64]) -> Result<f64, Error> {
        if args.len() != self.arg_count {
            return Err(Error::ArgumentCount {
                expected: self.arg_count,
                got: args.len(),
            });
        }
        let frames: SmallVec<[LoopFrame; 4]> =
            args.iter().map(|&value| LoopFrame::single(value)).collect();
        let mut cell = f64::NAN;
        let rows = [&mut cell as *mut f64];
        self.run(&frames, &rows)?;
        Ok(cell)
    }

    pub fn tabulate(&self, ranges: &[Range]) -> Result<Table, Error> {
        tabulation::check_range_count(ranges, self.arg_count)?;
        let mut table = Table::for_ranges(ranges)?;
        self.fill(&mut table, ranges)?;
        Ok(table)
    }

    pub fn tabulate_into(&self, table: &mut Table, ranges: &[Range]) -> Result<(), Error> {
        tabulation::check_range_count(ranges, self.arg_count)?;
        let counts = tabulation::counts(ranges)?;
        if !table.has_shape(&counts) {
            return Err(Error::TableShape);
        }
        self.fill(table, ranges)
    }

    fn fill(&self, table: &mut Table, ranges: &[Range]) -> Result<(), Error> {
        let mut frames = SmallVec::<[LoopFrame; 4]>::with_capacity(ranges.len());
        for range in ranges {
            frames.push(LoopFrame {
                begin: range.begin(),
                step: range.step(),
                count: range.count()? as i64,
            });
        }
        let rows = table.row_pointers();
        self.run(&frames, &rows)
    }
}

impl fmt::Debug for Tabulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tabulator")
            .field("source", &self.source)
            .field("arg_count", &self.arg_count)
            .field("checked", &self.checked)
            .field("captures", &self.captures.len())
            .finish()
    }
}

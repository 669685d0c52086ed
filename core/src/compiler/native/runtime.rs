//! Functions native code calls back into, and the per-thread fault slot
//! they report through.
//!
//! Native frames cannot unwind. A panicking bound function is caught here,
//! parked in the fault slot, and resumed by the wrapper once the generated
//! code has returned.

use std::any::Any;
use std::cell::RefCell;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::api::Error;
use crate::ir;
use crate::symbols::BoundFn;

pub(super) enum Fault {
    Panic(Box<dyn Any + Send + 'static>),
    NotFinite(f64),
}

thread_local! {
    static FAULT: RefCell<Option<Fault>> = const { RefCell::new(None) };
}

fn record(fault: Fault) {
    FAULT.with(|slot| {
        let mut slot = slot.borrow_mut();
        // A panic wins over a non-finite report; otherwise the first one
        // sticks.
        let replace = match (&*slot, &fault) {
            (None, _) => true,
            (Some(Fault::NotFinite(_)), Fault::Panic(_)) => true,
            _ => false,
        };
        if replace {
            *slot = Some(fault);
        }
    });
}

fn panicked() -> bool {
    FAULT.with(|slot| matches!(&*slot.borrow(), Some(Fault::Panic(_))))
}

/// Runs native code and turns whatever it reported into a result. A parked
/// panic is resumed here, on the calling thread.
pub(super) fn run_native<T>(call: impl FnOnce() -> T) -> Result<T, Error> {
    FAULT.with(|slot| slot.borrow_mut().take());
    let value = call();
    match FAULT.with(|slot| slot.borrow_mut().take()) {
        None => Ok(value),
        Some(Fault::NotFinite(value)) => Err(Error::NotFinite(value)),
        Some(Fault::Panic(payload)) => panic::resume_unwind(payload),
    }
}

pub(super) extern "C" fn calcjit_pow(base: f64, exponent: f64) -> f64 {
    ir::pow(base, exponent)
}

pub(super) extern "C" fn calcjit_rem(lhs: f64, rhs: f64) -> f64 {
    ir::rem(lhs, rhs)
}

pub(super) extern "C" fn calcjit_not_finite(value: f64) {
    record(Fault::NotFinite(value));
}

/// Trampoline for bound functions.
///
/// # Safety
/// `target` must point at a live `Arc<BoundFn>` and `args` at `total`
/// readable `f64`s.
pub(super) unsafe extern "C" fn calcjit_call_bound(
    target: *const c_void,
    args: *const f64,
    fixed: usize,
    total: usize,
) -> f64 {
    // Once a callee has panicked the result is discarded anyway; skip the
    // remaining calls.
    if panicked() {
        return f64::NAN;
    }
    let target = unsafe { &*target.cast::<Arc<BoundFn>>() };
    let args = unsafe { std::slice::from_raw_parts(args, total) };
    let (fixed, tail) = args.split_at(fixed.min(total));
    match panic::catch_unwind(AssertUnwindSafe(|| target(fixed, tail))) {
        Ok(value) => value,
        Err(payload) => {
            record(Fault::Panic(payload));
            f64::NAN
        }
    }
}

use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{Range, Table, check_range_count, counts};
use crate::api::{Calculation, Error};

/// A tabulation running on the blocking pool of a tokio runtime.
///
/// The result can be taken once, through [`TabulateTask::complete`].
/// Cancelling prevents a task that has not started from running and makes
/// `complete` fail with [`Error::TaskCancelled`]; a tabulation already in
/// progress runs to its end and its result is discarded.
#[derive(Debug)]
pub struct TabulateTask {
    handle: Option<JoinHandle<Result<Table, Error>>>,
    cancelled: Arc<AtomicBool>,
}

impl TabulateTask {
    /// Spawns on the runtime of the current context.
    pub fn spawn(calculation: Arc<dyn Calculation>, ranges: &[Range]) -> Result<Self, Error> {
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Self::spawn_on(&handle, calculation, ranges)
    }

    /// Spawns on the given runtime. Range problems are reported here, before
    /// anything is scheduled.
    pub fn spawn_on(
        runtime: &Handle,
        calculation: Arc<dyn Calculation>,
        ranges: &[Range],
    ) -> Result<Self, Error> {
        check_range_count(ranges, calculation.arg_count())?;
        let shape = counts(ranges)?;
        debug!(source = calculation.source(), ?shape, "spawning tabulation");

        let ranges = ranges.to_vec();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = runtime.spawn_blocking(move || {
            if flag.load(Ordering::Acquire) {
                return Err(Error::TaskCancelled);
            }
            calculation.tabulate(&ranges)
        });
        Ok(Self {
            handle: Some(handle),
            cancelled,
        })
    }

    /// Whether the result is ready (or already taken).
    pub fn is_completed(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Waits for the table. A panic raised by the calculation is resumed
    /// here.
    pub async fn complete(&mut self) -> Result<Table, Error> {
        let handle = self.handle.take().ok_or(Error::TaskConsumed)?;
        let outcome = handle.await;
        if self.is_cancelled() {
            return Err(Error::TaskCancelled);
        }
        match outcome {
            Ok(result) => result,
            Err(error) if error.is_panic() => panic::resume_unwind(error.into_panic()),
            Err(_) => Err(Error::TaskCancelled),
        }
    }
}

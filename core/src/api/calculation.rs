use std::sync::Arc;

use super::{Error, Evaluator, Interpreter, Tabulator};
use crate::tabulation::{Range, Table, TabulateTask};

/// The call surface shared by every compiled form of a formula.
///
/// Arguments are passed positionally, in the order they were registered
/// on the [`CalcContext`](super::CalcContext). Tabulation takes one
/// [`Range`] per argument.
pub trait Calculation: Send + Sync {
    fn source(&self) -> &str;

    fn arg_count(&self) -> usize;

    fn evaluate(&self, args: &[f64]) -> Result<f64, Error>;

    fn tabulate(&self, ranges: &[Range]) -> Result<Table, Error>;

    fn tabulate_into(&self, table: &mut Table, ranges: &[Range]) -> Result<(), Error>;

    /// Starts tabulating on the current tokio runtime.
    fn begin_tabulate(self: Arc<Self>, ranges: &[Range]) -> Result<TabulateTask, Error>
    where
        Self: Sized + 'static,
    {
        TabulateTask::spawn(self, ranges)
    }
}

macro_rules! delegate_calculation {
    ($($ty:ty),*) => {
        $(
            impl Calculation for $ty {
                fn source(&self) -> &str {
                    <$ty>::source(self)
                }

                fn arg_count(&self) -> usize {
                    <$ty>::arg_count(self)
                }

                fn evaluate(&self, args: &[f64]) -> Result<f64, Error> {
                    <$ty>::evaluate(self, args)
                }

                fn tabulate(&self, ranges: &[Range]) -> Result<Table, Error> {
                    <$ty>::tabulate(self, ranges)
                }

                fn tabulate_into(&self, table: &mut Table, ranges: &[Range]) -> Result<(), Error> {
                    <$ty>::tabulate_into(self, table, ranges)
                }
            }
        )*
    };
}

delegate_calculation!(Interpreter, Evaluator, Tabulator);

//! Ranges, jagged result tables and the tabulation drivers built on top of
//! any pointwise evaluation.

mod driver;
mod range;
mod table;
mod task;

pub use driver::{counts, tabulate, tabulate_into};
pub use range::{Range, RangeError, Values};
pub use table::Table;
pub use task::TabulateTask;

pub(crate) use driver::check_range_count;

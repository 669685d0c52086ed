//! Synchronous tabulation over a pointwise evaluation function.
//!
//! Used by the interpreter and as the reference the native loop nest must
//! agree with: samples advance by repeated addition of the step.

use smallvec::{SmallVec, smallvec};

use super::{Range, RangeError, Table};
use crate::api::Error;

/// The extent of each dimension, validating every range.
pub fn counts(ranges: &[Range]) -> Result<SmallVec<[usize; 4]>, RangeError> {
    ranges.iter().map(Range::count).collect()
}

/// Checks that a calculation over `arg_count` arguments can tabulate over
/// `ranges`.
pub(crate) fn check_range_count(ranges: &[Range], arg_count: usize) -> Result<(), Error> {
    if arg_count == 0 {
        return Err(Error::NothingToTabulate);
    }
    if ranges.len() != arg_count {
        return Err(Error::RangeCount {
            expected: arg_count,
            got: ranges.len(),
        });
    }
    Ok(())
}

/// Tabulates `f` over the cross product of `ranges` into a new table.
pub fn tabulate<F>(ranges: &[Range], f: F) -> Result<Table, Error>
where
    F: FnMut(&[f64]) -> Result<f64, Error>,
{
    if ranges.is_empty() {
        return Err(Error::NothingToTabulate);
    }
    let mut table = Table::for_ranges(ranges)?;
    fill(&mut table, ranges, f)?;
    Ok(table)
}

/// Tabulates `f` into an existing table of the matching shape.
pub fn tabulate_into<F>(table: &mut Table, ranges: &[Range], f: F) -> Result<(), Error>
where
    F: FnMut(&[f64]) -> Result<f64, Error>,
{
    if ranges.is_empty() {
        return Err(Error::NothingToTabulate);
    }
    if !table.has_shape(&counts(ranges)?) {
        return Err(Error::TableShape);
    }
    fill(table, ranges, f)
}

fn fill<F>(table: &mut Table, ranges: &[Range], mut f: F) -> Result<(), Error>
where
    F: FnMut(&[f64]) -> Result<f64, Error>,
{
    let mut args: SmallVec<[f64; 4]> = smallvec![0.0; ranges.len()];
    match (table, ranges) {
        (Table::Row(cells), [range]) => {
            args[0] = range.begin();
            for cell in cells.iter_mut() {
                *cell = f(&args)?;
                args[0] += range.step();
            }
            Ok(())
        }
        (Table::Nested(rows), [outer, inner]) => {
            args[0] = outer.begin();
            for row in rows.iter_mut() {
                let Table::Row(cells) = row else {
                    return Err(Error::TableShape);
                };
                args[1] = inner.begin();
                for cell in cells.iter_mut() {
                    *cell = f(&args)?;
                    args[1] += inner.step();
                }
                args[0] += outer.step();
            }
            Ok(())
        }
        (table, ranges) => walk(table, ranges, 0, &mut args, &mut f),
    }
}

/// Recursive walk for three or more dimensions.
fn walk<F>(
    table: &mut Table,
    ranges: &[Range],
    depth: usize,
    args: &mut [f64],
    f: &mut F,
) -> Result<(), Error>
where
    F: FnMut(&[f64]) -> Result<f64, Error>,
{
    let range = &ranges[depth];
    args[depth] = range.begin();
    match table {
        Table::Row(cells) => {
            for cell in cells.iter_mut() {
                *cell = f(args)?;
                args[depth] += range.step();
            }
        }
        Table::Nested(tables) => {
            for table in tables.iter_mut() {
                walk(table, ranges, depth + 1, args, f)?;
                args[depth] += range.step();
            }
        }
    }
    Ok(())
}

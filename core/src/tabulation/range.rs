use std::fmt;

use once_cell::sync::OnceCell;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range {0} is not a finite number")]
    NotFinite(&'static str),

    #[error("range step is too small to advance from the beginning (endless loop)")]
    EndlessLoop,

    #[error("range step sign does not match the direction from begin to end")]
    WrongStepSign,

    #[error("range has too many iterations")]
    TooManyIterations,

    #[error("range must be split into at least one step")]
    ZeroCount,
}

/// A stepped sequence of sample points from `begin` towards `end`,
/// inclusive when `end` is hit exactly.
///
/// Validity and the sample count are computed once, on first use, and
/// memoized. [`Range::new`] forces that computation up front.
#[derive(Clone)]
pub struct Range {
    begin: f64,
    end: f64,
    step: f64,
    count: OnceCell<Result<usize, RangeError>>,
}

impl Range {
    pub fn new(begin: f64, end: f64, step: f64) -> Result<Self, RangeError> {
        let range = Self::unchecked(begin, end, step);
        range.validate()?;
        Ok(range)
    }

    /// A range whose validity is checked lazily.
    pub fn unchecked(begin: f64, end: f64, step: f64) -> Self {
        Self {
            begin,
            end,
            step,
            count: OnceCell::new(),
        }
    }

    /// Splits `begin..end` into `count` equal steps.
    pub fn from_count(begin: f64, end: f64, count: usize) -> Result<Self, RangeError> {
        if count == 0 {
            return Err(RangeError::ZeroCount);
        }
        Self::new(begin, end, (end - begin) / count as f64)
    }

    pub fn with_begin(&self, begin: f64) -> Self {
        Self::unchecked(begin, self.end, self.step)
    }

    pub fn with_end(&self, end: f64) -> Self {
        Self::unchecked(self.begin, end, self.step)
    }

    pub fn with_step(&self, step: f64) -> Self {
        Self::unchecked(self.begin, self.end, step)
    }

    pub fn begin(&self) -> f64 {
        self.begin
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn validate(&self) -> Result<(), RangeError> {
        self.count().map(|_| ())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Number of sample points.
    pub fn count(&self) -> Result<usize, RangeError> {
        *self.count.get_or_init(|| compute_count(self.begin, self.end, self.step))
    }

    /// The sample points, produced by repeatedly adding `step` to `begin`
    /// the way the tabulators do.
    pub fn values(&self) -> Result<Values, RangeError> {
        Ok(Values {
            next: self.begin,
            step: self.step,
            remaining: self.count()?,
        })
    }
}

fn compute_count(begin: f64, end: f64, step: f64) -> Result<usize, RangeError> {
    if !begin.is_finite() {
        return Err(RangeError::NotFinite("begin"));
    }
    if !end.is_finite() {
        return Err(RangeError::NotFinite("end"));
    }
    if !step.is_finite() {
        return Err(RangeError::NotFinite("step"));
    }
    if begin + step == begin {
        return Err(RangeError::EndlessLoop);
    }

    let span = end - begin;
    if span != 0.0 && span.is_sign_negative() != step.is_sign_negative() {
        return Err(RangeError::WrongStepSign);
    }

    let steps = (span / step).floor();
    if !steps.is_finite() || steps + 1.0 > f64::from(i32::MAX) {
        return Err(RangeError::TooManyIterations);
    }
    Ok(steps as usize + 1)
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        self.begin == other.begin && self.end == other.end && self.step == other.step
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Range")
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("step", &self.step)
            .finish()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{} step {}]", self.begin, self.end, self.step)
    }
}

/// Iterator over the sample points of a [`Range`].
#[derive(Debug, Clone)]
pub struct Values {
    next: f64,
    step: f64,
    remaining: usize,
}

impl Iterator for Values {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let value = self.next;
        self.next += self.step;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Values {}

#[cfg(test)]
#[path = "range_test.rs"]
mod range_test;

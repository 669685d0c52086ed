use crate::optimizer::OptimizeModes;
use crate::parser::{Culture, DEFAULT_MAX_DEPTH, ParseSettings};

/// Options applied to every formula compiled through a
/// [`CalcContext`](super::CalcContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalcOptions {
    /// Match identifiers without regard to ASCII case.
    pub ignore_case: bool,
    /// Accept `2x` and `(a)(b)` as products.
    pub implicit_multiplication: bool,
    pub culture: Culture,
    pub optimize: OptimizeModes,
    /// Fail with [`Error::NotFinite`](super::Error::NotFinite) instead of
    /// returning NaN or an infinity.
    pub checked: bool,
    /// Maximum brace and call nesting.
    pub max_depth: usize,
}

impl Default for CalcOptions {
    fn default() -> Self {
        Self {
            ignore_case: false,
            implicit_multiplication: true,
            culture: Culture::INVARIANT,
            optimize: OptimizeModes::CONSTANT_FOLDING,
            checked: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CalcOptions {
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn with_implicit_multiplication(mut self, enabled: bool) -> Self {
        self.implicit_multiplication = enabled;
        self
    }

    pub fn with_culture(mut self, culture: Culture) -> Self {
        self.culture = culture;
        self
    }

    pub fn with_optimize(mut self, modes: OptimizeModes) -> Self {
        self.optimize = modes;
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub(crate) fn parse_settings(&self) -> ParseSettings {
        ParseSettings {
            culture: self.culture,
            implicit_multiplication: self.implicit_multiplication,
            max_depth: self.max_depth,
        }
    }
}

//! Hand-written recursive-descent parser. It resolves identifiers against
//! the symbol tables while scanning and emits IR directly, so parsing and
//! code generation happen in one pass.

mod error;
mod literal;
#[allow(clippy::module_inception)]
mod parser;

pub use error::{Span, SyntaxError, SyntaxErrorKind};
pub use literal::scan_literal;
pub use parser::parse;

use crate::symbols::RegistrationError;

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Separator characters used when reading numbers and argument lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Culture {
    decimal_separator: char,
    argument_separator: char,
}

impl Culture {
    /// `1.5`, `max(1, 2)`
    pub const INVARIANT: Culture = Culture {
        decimal_separator: '.',
        argument_separator: ',',
    };

    /// `1,5`, `max(1; 2)`
    pub const COMMA_DECIMAL: Culture = Culture {
        decimal_separator: ',',
        argument_separator: ';',
    };

    pub fn new(decimal_separator: char, argument_separator: char) -> Result<Self, RegistrationError> {
        for c in [decimal_separator, argument_separator] {
            let reserved = !c.is_ascii_punctuation() || "_()+-*/%^".contains(c);
            if reserved {
                return Err(RegistrationError::InvalidSeparator(c));
            }
        }
        if decimal_separator == argument_separator {
            return Err(RegistrationError::SeparatorClash);
        }
        Ok(Self {
            decimal_separator,
            argument_separator,
        })
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn argument_separator(&self) -> char {
        self.argument_separator
    }
}

impl Default for Culture {
    fn default() -> Self {
        Culture::INVARIANT
    }
}

/// Knobs that change how text is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseSettings {
    pub culture: Culture,
    pub implicit_multiplication: bool,
    pub max_depth: usize,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            culture: Culture::INVARIANT,
            implicit_multiplication: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

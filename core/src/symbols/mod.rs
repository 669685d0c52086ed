//! Symbol tables: arguments, constants and overloaded functions, plus the
//! resolver the parser queries for every identifier.

mod functions;
mod resolver;

pub use functions::{BoundFn, FunctionGroup, FunctionItem, Functions, Target};
pub use resolver::{Binding, SymbolResolver};

use hashbrown::HashMap;
use thiserror::Error;

/// Errors raised while populating symbol tables or configuring a context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("'{0}' is already defined")]
    Duplicate(String),

    #[error("function '{name}' already has an overload taking {fixed} fixed argument(s){}", tail_note(.variadic))]
    OverloadConflict {
        name: String,
        fixed: usize,
        variadic: bool,
    },

    #[error("'{0}' cannot be used as a separator")]
    InvalidSeparator(char),

    #[error("decimal and argument separators must differ")]
    SeparatorClash,
}

fn tail_note(variadic: &bool) -> &'static str {
    if *variadic { " and a variadic tail" } else { "" }
}

/// Returns true when `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => chars.all(is_identifier_part),
        _ => false,
    }
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn check_identifier(name: &str) -> Result<(), RegistrationError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(RegistrationError::InvalidIdentifier(name.into()))
    }
}

/// Ordered list of argument names. The position of a name is the index of
/// the value callers pass at evaluation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    names: Vec<String>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Result<Self, RegistrationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut arguments = Self::new();
        for name in names {
            arguments.push(name)?;
        }
        Ok(arguments)
    }

    /// Appends an argument and returns its index.
    pub fn push(&mut self, name: impl Into<String>) -> Result<usize, RegistrationError> {
        let name = name.into();
        check_identifier(&name)?;
        if self.names.iter().any(|existing| *existing == name) {
            return Err(RegistrationError::Duplicate(name));
        }
        self.names.push(name);
        Ok(self.names.len() - 1)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Named constant values.
#[derive(Debug, Clone, Default)]
pub struct Constants {
    values: HashMap<String, f64>,
}

impl Constants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new constant; an existing name is rejected.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Result<(), RegistrationError> {
        let name = name.into();
        check_identifier(&name)?;
        if self.values.contains_key(&name) {
            return Err(RegistrationError::Duplicate(name));
        }
        self.values.insert(name, value);
        Ok(())
    }

    /// Adds or replaces a constant, returning the previous value.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: f64,
    ) -> Result<Option<f64>, RegistrationError> {
        let name = name.into();
        check_identifier(&name)?;
        Ok(self.values.insert(name, value))
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

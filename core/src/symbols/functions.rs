use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use smallvec::SmallVec;

use super::{RegistrationError, check_identifier};

/// Signature of a bound function: the fixed arguments followed by the
/// variadic tail (empty for fixed-arity overloads).
pub type BoundFn = dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync;

/// Call target of an overload.
///
/// Static targets are plain C-ABI functions that native code calls
/// directly. Anything that needs state goes through `Bound`.
#[derive(Clone)]
pub enum Target {
    Static0(extern "C" fn() -> f64),
    Static1(extern "C" fn(f64) -> f64),
    Static2(extern "C" fn(f64, f64) -> f64),
    Bound(Arc<BoundFn>),
}

/// One overload of a function: `fixed` leading parameters, optionally
/// followed by a variadic tail.
#[derive(Clone)]
pub struct FunctionItem {
    fixed: usize,
    variadic: bool,
    target: Target,
}

impl FunctionItem {
    pub fn nullary(f: extern "C" fn() -> f64) -> Self {
        Self {
            fixed: 0,
            variadic: false,
            target: Target::Static0(f),
        }
    }

    pub fn unary(f: extern "C" fn(f64) -> f64) -> Self {
        Self {
            fixed: 1,
            variadic: false,
            target: Target::Static1(f),
        }
    }

    pub fn binary(f: extern "C" fn(f64, f64) -> f64) -> Self {
        Self {
            fixed: 2,
            variadic: false,
            target: Target::Static2(f),
        }
    }

    /// A closure taking exactly `count` arguments.
    pub fn fixed<F>(count: usize, f: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            fixed: count,
            variadic: false,
            target: Target::Bound(Arc::new(move |fixed: &[f64], _: &[f64]| f(fixed))),
        }
    }

    /// A closure taking `fixed` leading arguments and any number of
    /// trailing ones.
    pub fn variadic<F>(fixed: usize, f: F) -> Self
    where
        F: Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            fixed,
            variadic: true,
            target: Target::Bound(Arc::new(f)),
        }
    }

    pub fn fixed_count(&self) -> usize {
        self.fixed
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Overload identity inside a group.
    pub fn key(&self) -> (usize, bool) {
        (self.fixed, self.variadic)
    }

    pub fn accepts(&self, count: usize) -> bool {
        if self.variadic {
            count >= self.fixed
        } else {
            count == self.fixed
        }
    }

    /// Calls the target with `args` in source order. The caller guarantees
    /// `self.accepts(args.len())`.
    pub fn call(&self, args: &[f64]) -> f64 {
        match &self.target {
            Target::Static0(f) => f(),
            Target::Static1(f) => f(args[0]),
            Target::Static2(f) => f(args[0], args[1]),
            Target::Bound(f) => {
                let (fixed, tail) = args.split_at(self.fixed);
                f(fixed, tail)
            }
        }
    }
}

impl fmt::Debug for FunctionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.target {
            Target::Static0(_) | Target::Static1(_) | Target::Static2(_) => "static",
            Target::Bound(_) => "bound",
        };
        f.debug_struct("FunctionItem")
            .field("fixed", &self.fixed)
            .field("variadic", &self.variadic)
            .field("target", &target)
            .finish()
    }
}

/// All overloads registered under one name.
#[derive(Debug, Clone)]
pub struct FunctionGroup {
    name: String,
    overloads: SmallVec<[FunctionItem; 2]>,
}

impl FunctionGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overloads: SmallVec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, item: FunctionItem) -> Result<(), RegistrationError> {
        if self.overloads.iter().any(|o| o.key() == item.key()) {
            return Err(RegistrationError::OverloadConflict {
                name: self.name.clone(),
                fixed: item.fixed,
                variadic: item.variadic,
            });
        }
        self.overloads.push(item);
        Ok(())
    }

    /// Picks the overload for a call with `count` arguments: an exact
    /// fixed-arity match first, then the variadic overload with the most
    /// fixed parameters that still fits.
    pub fn resolve(&self, count: usize) -> Option<&FunctionItem> {
        if let Some(exact) = self
            .overloads
            .iter()
            .find(|o| !o.variadic && o.fixed == count)
        {
            return Some(exact);
        }
        self.overloads
            .iter()
            .filter(|o| o.variadic && o.fixed <= count)
            .max_by_key(|o| o.fixed)
    }

    pub fn overloads(&self) -> &[FunctionItem] {
        &self.overloads
    }

    pub fn len(&self) -> usize {
        self.overloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overloads.is_empty()
    }
}

/// Function table keyed by name; each entry is an overload group.
#[derive(Debug, Clone, Default)]
pub struct Functions {
    groups: HashMap<String, FunctionGroup>,
}

impl Functions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an overload, creating the group on first use.
    pub fn add(&mut self, name: impl Into<String>, item: FunctionItem) -> Result<(), RegistrationError> {
        let name = name.into();
        check_identifier(&name)?;
        self.groups
            .entry(name)
            .or_insert_with_key(|name| FunctionGroup::new(name.clone()))
            .add(item)
    }

    pub fn get(&self, name: &str) -> Option<&FunctionGroup> {
        self.groups.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FunctionGroup> {
        self.groups.remove(name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionGroup> {
        self.groups.values()
    }
}

#[cfg(test)]
#[path = "functions_test.rs"]
mod functions_test;

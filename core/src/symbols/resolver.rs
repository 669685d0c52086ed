use smallvec::SmallVec;

use super::{Arguments, Constants, FunctionGroup, Functions};

/// What a name refers to.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    Argument(usize),
    Constant(f64),
    Function(&'a FunctionGroup),
}

impl Binding<'_> {
    pub fn is_function(&self) -> bool {
        matches!(self, Binding::Function(_))
    }
}

/// Read-only view over the three symbol tables.
#[derive(Clone, Copy)]
pub struct SymbolResolver<'a> {
    arguments: &'a Arguments,
    constants: &'a Constants,
    functions: &'a Functions,
    ignore_case: bool,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(
        arguments: &'a Arguments,
        constants: &'a Constants,
        functions: &'a Functions,
        ignore_case: bool,
    ) -> Self {
        Self {
            arguments,
            constants,
            functions,
            ignore_case,
        }
    }

    pub fn arguments(&self) -> &'a Arguments {
        self.arguments
    }

    /// Every binding of `name` across all tables. Empty means unknown;
    /// more than one means the caller has to disambiguate.
    pub fn resolve(&self, name: &str) -> SmallVec<[Binding<'a>; 2]> {
        let mut found = SmallVec::new();
        if self.ignore_case {
            self.resolve_folded(name, &mut found);
        } else {
            if let Some(index) = self.arguments.iter().position(|arg| arg == name) {
                found.push(Binding::Argument(index));
            }
            if let Some(value) = self.constants.get(name) {
                found.push(Binding::Constant(value));
            }
            if let Some(group) = self.functions.get(name) {
                found.push(Binding::Function(group));
            }
        }
        found
    }

    fn resolve_folded(&self, name: &str, found: &mut SmallVec<[Binding<'a>; 2]>) {
        for (index, arg) in self.arguments.iter().enumerate() {
            if arg.eq_ignore_ascii_case(name) {
                found.push(Binding::Argument(index));
            }
        }
        for (constant, value) in self.constants.iter() {
            if constant.eq_ignore_ascii_case(name) {
                found.push(Binding::Constant(value));
            }
        }
        for group in self.functions.iter() {
            if group.name().eq_ignore_ascii_case(name) {
                found.push(Binding::Function(group));
            }
        }
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod resolver_test;

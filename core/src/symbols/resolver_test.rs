use pretty_assertions::assert_eq;

use super::*;
use crate::symbols::FunctionItem;

extern "C" fn sin(x: f64) -> f64 {
    x.sin()
}

fn describe(bindings: &[Binding<'_>]) -> Vec<String> {
    bindings
        .iter()
        .map(|b| match b {
            Binding::Argument(i) => format!("arg {i}"),
            Binding::Constant(v) => format!("const {v}"),
            Binding::Function(g) => format!("fn {}", g.name()),
        })
        .collect()
}

fn tables() -> (Arguments, Constants, Functions) {
    let arguments = Arguments::from_names(["x", "SIN"]).unwrap();
    let mut constants = Constants::new();
    constants.insert("x", 1.5).unwrap();
    constants.insert("k", 2.0).unwrap();
    let mut functions = Functions::new();
    functions.add("sin", FunctionItem::unary(sin)).unwrap();
    (arguments, constants, functions)
}

#[test]
fn test_case_sensitive_lookup() {
    let (arguments, constants, functions) = tables();
    let resolver = SymbolResolver::new(&arguments, &constants, &functions, false);

    assert_eq!(describe(&resolver.resolve("sin")), vec!["fn sin"]);
    assert_eq!(describe(&resolver.resolve("SIN")), vec!["arg 1"]);
    assert_eq!(describe(&resolver.resolve("x")), vec!["arg 0", "const 1.5"]);
    assert!(resolver.resolve("K").is_empty());
}

#[test]
fn test_case_insensitive_lookup_collects_every_match() {
    let (arguments, constants, functions) = tables();
    let resolver = SymbolResolver::new(&arguments, &constants, &functions, true);

    assert_eq!(describe(&resolver.resolve("Sin")), vec!["arg 1", "fn sin"]);
    assert_eq!(describe(&resolver.resolve("K")), vec!["const 2"]);
}

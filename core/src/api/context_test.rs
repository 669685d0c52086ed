use pretty_assertions::assert_eq;

use super::*;
use crate::optimizer::OptimizeModes;
use crate::parser::{Culture, SyntaxErrorKind};
use crate::tabulation::{Range, Table};
use crate::test_utils::init_test_logging;

extern "C" fn sin(x: f64) -> f64 {
    x.sin()
}

extern "C" fn shouting_sin(x: f64) -> f64 {
    100.0 * x.sin()
}

extern "C" fn max2(x: f64, y: f64) -> f64 {
    x.max(y)
}

fn syntax(error: Error) -> (SyntaxErrorKind, usize, usize) {
    match error {
        Error::Syntax(error) => (error.kind.clone(), error.position(), error.length()),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn test_evaluate_simple() {
    init_test_logging();
    let context = CalcContext::new();
    assert_eq!(context.evaluate("2+2*2", &[]).unwrap(), 6.0);
    assert_eq!(context.create_interpreter("2+2*2").unwrap().evaluate(&[]).unwrap(), 6.0);
}

#[test]
fn test_max_with_comma_decimal_culture() {
    let mut context =
        CalcContext::with_options(CalcOptions::default().with_culture(Culture::COMMA_DECIMAL));
    context.add_function("max", FunctionItem::binary(max2)).unwrap();

    assert_eq!(context.evaluate("max(1;2)", &[]).unwrap(), 2.0);
    assert_eq!(context.evaluate("max(1,5;0,5)", &[]).unwrap(), 1.5);
    assert_eq!(
        syntax(context.validate("max(1;)").unwrap_err()),
        (SyntaxErrorKind::MisplacedSeparator, 5, 1)
    );
}

#[test]
fn test_implicit_multiplication_option() {
    let mut context = CalcContext::new();
    assert_eq!(context.evaluate("(2+2)2", &[]).unwrap(), 8.0);

    context.set_options(context.options().with_implicit_multiplication(false));
    assert_eq!(
        syntax(context.evaluate("(2+2)2", &[]).unwrap_err()),
        (SyntaxErrorKind::MissingOperator, 5, 1)
    );
}

#[test]
fn test_case_sensitivity() {
    let mut context = CalcContext::new();
    context.add_function("sin", FunctionItem::unary(sin)).unwrap();
    context.add_function("SIN", FunctionItem::unary(shouting_sin)).unwrap();

    assert_eq!(context.evaluate("sin(0.5)", &[]).unwrap(), 0.5f64.sin());
    assert_eq!(context.evaluate("SIN(0.5)", &[]).unwrap(), 100.0 * 0.5f64.sin());

    context.set_options(context.options().with_ignore_case(true));
    let (kind, position, _) = syntax(context.validate("sin(0.5)").unwrap_err());
    assert!(matches!(kind, SyntaxErrorKind::AmbiguousIdentifier(_)));
    assert_eq!(position, 0);
}

#[test]
fn test_validate_reports_positions() {
    let mut context = CalcContext::new();
    context.add_argument("x").unwrap();
    assert!(context.validate("x * (1 + x)").is_ok());
    assert_eq!(
        syntax(context.validate("x + y").unwrap_err()),
        (SyntaxErrorKind::UnknownIdentifier("y".into()), 4, 1)
    );
    assert_eq!(
        syntax(context.validate("x +").unwrap_err()),
        (SyntaxErrorKind::MissingOperand('+'), 2, 1)
    );
}

#[test]
fn test_argument_count_is_checked_before_parsing() {
    let mut context = CalcContext::new();
    context.add_argument("x").unwrap();
    assert!(matches!(
        context.evaluate("this is not parsed", &[]),
        Err(Error::ArgumentCount {
            expected: 1,
            got: 0
        })
    ));
}

#[test]
fn test_checked_evaluate() {
    let mut context = CalcContext::with_options(CalcOptions::default().with_checked(true));
    context.add_argument("x").unwrap();
    assert!(matches!(
        context.evaluate("x / 0", &[1.0]),
        Err(Error::NotFinite(value)) if value == f64::INFINITY
    ));
    assert_eq!(context.evaluate("x / 2", &[1.0]).unwrap(), 0.5);
}

#[test]
fn test_calculations_do_not_track_later_changes() {
    let mut context = CalcContext::new();
    context.add_argument("x").unwrap();
    context.add_constant("k", 2.0).unwrap();
    let before = context.create_interpreter("k x").unwrap();
    let native = context.create_calculation("k x").unwrap();

    context.constants_mut().set("k", 10.0).unwrap();
    context.add_argument("y").unwrap();

    assert_eq!(before.evaluate(&[3.0]).unwrap(), 6.0);
    assert_eq!(native.evaluate(&[3.0]).unwrap(), 6.0);
    assert_eq!(context.evaluate("k x + y", &[3.0, 1.0]).unwrap(), 31.0);
}

#[test]
fn test_optimizer_does_not_change_results() {
    let mut context = CalcContext::new();
    context.add_argument("x").unwrap();
    context.add_function("max", FunctionItem::binary(max2)).unwrap();
    let sources = [
        "x^3 - 2^3",
        "max(2, 3) * x",
        "-(1 + 2) * x % 5",
        "x^2.5 + 7 / 3",
        "x^5",
        "x^7",
        "x^8 - x^2",
    ];

    for source in sources {
        for modes in [OptimizeModes::NONE, OptimizeModes::CONSTANT_FOLDING, OptimizeModes::ALL] {
            context.set_options(context.options().with_optimize(modes));
            let interpreter = context.create_interpreter(source).unwrap();
            for x in [-2.0, 0.0, 1.5, 4.0, 1.1, 0.3, 1.0000001] {
                let expected = {
                    let plain = CalcOptions::default().with_optimize(OptimizeModes::NONE);
                    let mut reference = CalcContext::with_options(plain);
                    reference.add_argument("x").unwrap();
                    reference
                        .add_function("max", FunctionItem::binary(max2))
                        .unwrap();
                    reference.evaluate(source, &[x]).unwrap()
                };
                let actual = interpreter.evaluate(&[x]).unwrap();
                assert!(
                    actual.to_bits() == expected.to_bits() || (actual.is_nan() && expected.is_nan()),
                    "{source} at {x} with {modes:?}: {actual:e} != {expected:e}"
                );
            }
        }
    }
}

#[test]
fn test_function_folding_calls_closures_while_compiling() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut context = CalcContext::new();
    context.add_argument("x").unwrap();
    context
        .add_function("g", FunctionItem::fixed(1, move |args| {
            counter.fetch_add(1, Ordering::SeqCst);
            args[0] * 10.0
        }))
        .unwrap();
    context
        .add_function("boom", FunctionItem::fixed(1, |_| panic!("boom")))
        .unwrap();
    context.set_options(context.options().with_optimize(OptimizeModes::ALL));

    let interpreter = context.create_interpreter("g(2) + x").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(interpreter.evaluate(&[1.0]).unwrap(), 21.0);
    assert_eq!(interpreter.evaluate(&[2.0]).unwrap(), 22.0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A folded call that panics does so during compilation.
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        context.create_interpreter("boom(1) + x")
    }));
    assert!(outcome.is_err());

    // Without folding the panic waits for evaluation.
    context.set_options(context.options().with_optimize(OptimizeModes::CONSTANT_FOLDING));
    let interpreter = context.create_interpreter("boom(1) + x").unwrap();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        interpreter.evaluate(&[0.0])
    }));
    assert!(outcome.is_err());
}

#[test]
fn test_tabulator_requires_arguments() {
    let context = CalcContext::new();
    assert!(matches!(
        context.create_tabulator("1 + 1"),
        Err(Error::NothingToTabulate)
    ));
}

#[test]
fn test_create_calculation_tabulates() {
    let mut context = CalcContext::new();
    context.add_argument("x").unwrap();
    let calculation = context.create_calculation("2*x").unwrap();
    assert_eq!(calculation.arg_count(), 1);
    assert_eq!(calculation.source(), "2*x");

    let table = calculation
        .tabulate(&[Range::new(0.0, 10.0, 1.0).unwrap()])
        .unwrap();
    let expected: Vec<f64> = (0..=10).map(|i| f64::from(2 * i)).collect();
    assert_eq!(table, Table::Row(expected));

    assert!(matches!(
        calculation.tabulate(&[Range::unchecked(5.0, 0.0, 1.0)]),
        Err(Error::Range(crate::tabulation::RangeError::WrongStepSign))
    ));
}

#[test]
fn test_registration_errors() {
    let mut context = CalcContext::new();
    assert!(context.add_argument("1x").is_err());
    context.add_argument("x").unwrap();
    assert!(context.add_argument("x").is_err());
    context.add_constant("c", 1.0).unwrap();
    assert!(context.add_constant("c", 2.0).is_err());
    context.add_function("max", FunctionItem::binary(max2)).unwrap();
    assert!(context.add_function("max", FunctionItem::binary(max2)).is_err());
}

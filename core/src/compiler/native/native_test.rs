use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;

use super::*;
use crate::optimizer::{OptimizeModes, Optimizer};
use crate::parser::{ParseSettings, parse};
use crate::symbols::{Arguments, Constants, FunctionItem, Functions, SymbolResolver};
use crate::tabulation::{Range, Table};
use crate::test_utils::init_test_logging;

extern "C" fn half(x: f64) -> f64 {
    x / 2.0
}

extern "C" fn seven() -> f64 {
    7.0
}

struct Fixture {
    arguments: Arguments,
    constants: Constants,
    functions: Functions,
}

impl Fixture {
    fn new(names: &[&str]) -> Self {
        let mut functions = Functions::new();
        functions.add("half", FunctionItem::unary(half)).unwrap();
        functions.add("seven", FunctionItem::nullary(seven)).unwrap();
        functions
            .add("sum", FunctionItem::variadic(0, |_, tail| tail.iter().sum()))
            .unwrap();
        functions
            .add(
                "clamp",
                FunctionItem::fixed(3, |args| args[0].clamp(args[1], args[2])),
            )
            .unwrap();
        Self {
            arguments: Arguments::from_names(names.iter().copied()).unwrap(),
            constants: Constants::new(),
            functions,
        }
    }

    fn feed<'s>(
        &'s self,
        source: &'s str,
    ) -> impl FnOnce(&mut dyn IrSink) -> Result<(), Error> + 's {
        move |sink| {
            let resolver =
                SymbolResolver::new(&self.arguments, &self.constants, &self.functions, false);
            let mut optimizer = Optimizer::new(OptimizeModes::CONSTANT_FOLDING, sink);
            parse(source, &resolver, &ParseSettings::default(), &mut optimizer)?;
            Ok(())
        }
    }

    fn evaluator(&self, source: &str, checked: bool) -> Evaluator {
        NativeCompiler::new()
            .unwrap()
            .compile_evaluator(source, self.arguments.len(), checked, self.feed(source))
            .unwrap()
    }

    fn tabulator(&self, source: &str, checked: bool) -> Tabulator {
        NativeCompiler::new()
            .unwrap()
            .compile_tabulator(source, self.arguments.len(), checked, self.feed(source))
            .unwrap()
    }
}

#[test]
fn test_evaluator_specializations() {
    if !is_supported() {
        return;
    }
    init_test_logging();

    let nullary = Fixture::new(&[]).evaluator("2 + 2 * 2", false);
    assert_eq!(nullary.evaluate(&[]).unwrap(), 6.0);

    let unary = Fixture::new(&["x"]).evaluator("x^2 - half(x)", false);
    assert_eq!(unary.evaluate(&[4.0]).unwrap(), 14.0);

    let binary = Fixture::new(&["x", "y"]).evaluator("x % y + seven()", false);
    assert_eq!(binary.evaluate(&[-7.0, 3.0]).unwrap(), 6.0);

    let vector = Fixture::new(&["a", "b", "c", "d"]).evaluator("clamp(a, b, c) * d", false);
    assert_eq!(vector.evaluate(&[5.0, 0.0, 2.0, 10.0]).unwrap(), 20.0);
    assert_eq!(vector.arg_count(), 4);
}

#[test]
fn test_evaluator_rejects_wrong_argument_count() {
    if !is_supported() {
        return;
    }
    let evaluator = Fixture::new(&["x", "y"]).evaluator("x + y", false);
    assert!(matches!(
        evaluator.evaluate(&[1.0]),
        Err(Error::ArgumentCount {
            expected: 2,
            got: 1
        })
    ));
}

#[test]
fn test_variadic_calls_share_one_capture() {
    if !is_supported() {
        return;
    }
    let evaluator = Fixture::new(&["x"]).evaluator("sum(x, 1) + sum() + sum(x, x, x)", false);
    assert_eq!(evaluator.captures.len(), 1);
    assert_eq!(evaluator.evaluate(&[2.0]).unwrap(), 9.0);
}

#[test]
fn test_checked_mode_reports_non_finite() {
    if !is_supported() {
        return;
    }
    let fixture = Fixture::new(&["x"]);
    let unchecked = fixture.evaluator("1 / x", false);
    assert_eq!(unchecked.evaluate(&[0.0]).unwrap(), f64::INFINITY);

    let checked = fixture.evaluator("1 / x", true);
    assert_eq!(checked.evaluate(&[4.0]).unwrap(), 0.25);
    assert!(matches!(
        checked.evaluate(&[0.0]),
        Err(Error::NotFinite(value)) if value == f64::INFINITY
    ));
}

#[test]
fn test_bound_panic_resumes_on_caller() {
    if !is_supported() {
        return;
    }
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut fixture = Fixture::new(&["x"]);
    fixture
        .functions
        .add(
            "boom",
            FunctionItem::fixed(1, move |args| {
                counter.fetch_add(1, Ordering::SeqCst);
                if args[0] < 0.0 {
                    panic!("negative input");
                }
                args[0]
            }),
        )
        .unwrap();
    let evaluator = fixture.evaluator("boom(x) + boom(x)", false);

    assert_eq!(evaluator.evaluate(&[1.0]).unwrap(), 2.0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        evaluator.evaluate(&[-1.0])
    }));
    assert!(outcome.is_err());
    // The second call was skipped once the first one panicked.
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // The fault slot was cleared by the unwinding call.
    assert_eq!(evaluator.evaluate(&[3.0]).unwrap(), 6.0);
}

#[test]
fn test_tabulator_one_dimension() {
    if !is_supported() {
        return;
    }
    let tabulator = Fixture::new(&["x"]).tabulator("2*x", false);
    let table = tabulator.tabulate(&[Range::new(0.0, 10.0, 1.0).unwrap()]).unwrap();
    let expected: Vec<f64> = (0..=10).map(|i| 2.0 * i as f64).collect();
    assert_eq!(table, Table::Row(expected));
}

#[test]
fn test_tabulator_three_dimensions() {
    if !is_supported() {
        return;
    }
    let tabulator = Fixture::new(&["x", "y", "z"]).tabulator("100x + 10y + z", false);
    let ranges = [
        Range::new(1.0, 2.0, 1.0).unwrap(),
        Range::new(0.0, 1.0, 0.5).unwrap(),
        Range::new(3.0, 0.0, -1.0).unwrap(),
    ];
    let table = tabulator.tabulate(&ranges).unwrap();

    assert!(table.has_shape(&[2, 3, 4]));
    assert_eq!(table.get(&[0, 0, 0]), Some(103.0));
    assert_eq!(table.get(&[1, 2, 3]), Some(210.0));
    assert_eq!(table.get(&[0, 1, 2]), Some(106.0));
    assert_eq!(tabulator.evaluate(&[2.0, 0.5, 1.0]).unwrap(), 206.0);
}

#[test]
fn test_tabulator_into_checks_shape() {
    if !is_supported() {
        return;
    }
    let tabulator = Fixture::new(&["x", "y"]).tabulator("x * y", false);
    let ranges = [
        Range::new(1.0, 3.0, 1.0).unwrap(),
        Range::new(1.0, 2.0, 1.0).unwrap(),
    ];

    let mut wrong = Table::with_shape(&[2, 3]);
    assert!(matches!(
        tabulator.tabulate_into(&mut wrong, &ranges),
        Err(Error::TableShape)
    ));

    let mut table = Table::with_shape(&[3, 2]);
    tabulator.tabulate_into(&mut table, &ranges).unwrap();
    assert_eq!(
        table,
        Table::Nested(vec![
            Table::Row(vec![1.0, 2.0]),
            Table::Row(vec![2.0, 4.0]),
            Table::Row(vec![3.0, 6.0]),
        ])
    );
}

#[test]
fn test_checked_tabulator_reports_first_bad_sample() {
    if !is_supported() {
        return;
    }
    let tabulator = Fixture::new(&["x"]).tabulator("1 / x", true);
    let outcome = tabulator.tabulate(&[Range::new(-1.0, 1.0, 1.0).unwrap()]);
    assert!(matches!(outcome, Err(Error::NotFinite(value)) if value == f64::INFINITY));
}

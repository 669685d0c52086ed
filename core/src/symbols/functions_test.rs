use pretty_assertions::assert_eq;

use super::*;

extern "C" fn neg(x: f64) -> f64 {
    -x
}

extern "C" fn sub(x: f64, y: f64) -> f64 {
    x - y
}

fn sum_all(fixed: &[f64], tail: &[f64]) -> f64 {
    fixed.iter().chain(tail).sum()
}

fn resolved_key(group: &FunctionGroup, count: usize) -> Option<(usize, bool)> {
    group.resolve(count).map(FunctionItem::key)
}

#[test]
fn test_exact_arity_beats_variadic() {
    let mut group = FunctionGroup::new("f");
    group.add(FunctionItem::variadic(1, sum_all)).unwrap();
    group.add(FunctionItem::binary(sub)).unwrap();

    assert_eq!(resolved_key(&group, 2), Some((2, false)));
    assert_eq!(resolved_key(&group, 1), Some((1, true)));
    assert_eq!(resolved_key(&group, 5), Some((1, true)));
    assert_eq!(resolved_key(&group, 0), None);
}

#[test]
fn test_variadic_with_most_fixed_parameters_wins() {
    let mut group = FunctionGroup::new("f");
    group.add(FunctionItem::variadic(0, sum_all)).unwrap();
    group.add(FunctionItem::variadic(2, sum_all)).unwrap();

    assert_eq!(resolved_key(&group, 0), Some((0, true)));
    assert_eq!(resolved_key(&group, 1), Some((0, true)));
    assert_eq!(resolved_key(&group, 2), Some((2, true)));
    assert_eq!(resolved_key(&group, 7), Some((2, true)));
}

#[test]
fn test_registration_order_does_not_matter() {
    let items = || {
        vec![
            FunctionItem::unary(neg),
            FunctionItem::binary(sub),
            FunctionItem::variadic(1, sum_all),
            FunctionItem::variadic(3, sum_all),
        ]
    };
    let mut forward = FunctionGroup::new("f");
    for item in items() {
        forward.add(item).unwrap();
    }
    let mut backward = FunctionGroup::new("f");
    for item in items().into_iter().rev() {
        backward.add(item).unwrap();
    }

    for count in 0..6 {
        assert_eq!(
            resolved_key(&forward, count),
            resolved_key(&backward, count),
            "count = {count}"
        );
    }
}

#[test]
fn test_conflicting_overload_is_rejected() {
    let mut functions = Functions::new();
    functions.add("f", FunctionItem::unary(neg)).unwrap();
    let err = functions
        .add("f", FunctionItem::fixed(1, |args| args[0]))
        .unwrap_err();
    assert_eq!(
        err,
        RegistrationError::OverloadConflict {
            name: "f".into(),
            fixed: 1,
            variadic: false,
        }
    );
    // A variadic overload with the same fixed count is a different key.
    functions.add("f", FunctionItem::variadic(1, sum_all)).unwrap();
    assert_eq!(functions.get("f").unwrap().len(), 2);
}

#[test]
fn test_call_splits_fixed_and_tail() {
    let item = FunctionItem::variadic(1, |fixed, tail| fixed[0] * 100.0 + tail.len() as f64);
    assert_eq!(item.call(&[2.0, 9.0, 9.0, 9.0]), 203.0);

    let item = FunctionItem::fixed(3, |args| args[0] - args[1] - args[2]);
    assert_eq!(item.call(&[10.0, 1.0, 2.0]), 7.0);

    assert_eq!(FunctionItem::binary(sub).call(&[5.0, 3.0]), 2.0);
}

#[test]
fn test_invalid_function_name() {
    let mut functions = Functions::new();
    assert_eq!(
        functions.add("no way", FunctionItem::unary(neg)),
        Err(RegistrationError::InvalidIdentifier("no way".into()))
    );
    assert!(functions.is_empty());
}

use pretty_assertions::assert_eq;

use super::*;
use crate::ir::render;
use crate::parser::Culture;
use crate::symbols::{Arguments, Constants, Functions};

extern "C" fn sin(x: f64) -> f64 {
    x.sin()
}

extern "C" fn max2(x: f64, y: f64) -> f64 {
    x.max(y)
}

extern "C" fn one() -> f64 {
    1.0
}

struct Tables {
    arguments: Arguments,
    constants: Constants,
    functions: Functions,
}

fn tables() -> Tables {
    let arguments = Arguments::from_names(["x", "y"]).unwrap();
    let mut constants = Constants::new();
    constants.insert("k", 2.0).unwrap();
    constants.insert("X", 7.0).unwrap();
    let mut functions = Functions::new();
    functions.add("sin", FunctionItem::unary(sin)).unwrap();
    functions.add("max", FunctionItem::binary(max2)).unwrap();
    functions
        .add("max", FunctionItem::variadic(1, |fixed, tail| {
            tail.iter().fold(fixed[0], |acc, v| acc.max(*v))
        }))
        .unwrap();
    functions.add("f", FunctionItem::nullary(one)).unwrap();
    functions.add("k", FunctionItem::unary(sin)).unwrap();
    functions.add("xin", FunctionItem::unary(sin)).unwrap();
    Tables {
        arguments,
        constants,
        functions,
    }
}

fn parse_with(
    source: &str,
    settings: &ParseSettings,
    ignore_case: bool,
) -> Result<String, SyntaxError> {
    let tables = tables();
    let resolver = SymbolResolver::new(
        &tables.arguments,
        &tables.constants,
        &tables.functions,
        ignore_case,
    );
    let mut events = Vec::new();
    parse(source, &resolver, settings, &mut events)?;
    Ok(render(&events))
}

fn ir(source: &str) -> String {
    parse_with(source, &ParseSettings::default(), false).unwrap()
}

fn err_with(source: &str, settings: &ParseSettings) -> (SyntaxErrorKind, usize, usize) {
    let err = parse_with(source, settings, false).unwrap_err();
    let (position, length) = (err.position(), err.length());
    (err.kind, position, length)
}

fn err(source: &str) -> (SyntaxErrorKind, usize, usize) {
    err_with(source, &ParseSettings::default())
}

fn explicit_only() -> ParseSettings {
    ParseSettings {
        implicit_multiplication: false,
        ..ParseSettings::default()
    }
}

#[test]
fn test_precedence() {
    assert_eq!(ir("2+2*2"), "2 2 2 * + end");
    assert_eq!(ir("2*2+2"), "2 2 * 2 + end");
    assert_eq!(ir("8-3-2"), "8 3 - 2 - end");
    assert_eq!(ir("7 % 4 / 2"), "7 4 % 2 / end");
}

#[test]
fn test_power_and_negation() {
    // `^` pops an equal-precedence `^`: (2^3)^2.
    assert_eq!(ir("2^3^2"), "2 3 ^ 2 ^ end");
    // Unary minus binds looser than `^`: -(2^2).
    assert_eq!(ir("-2^2"), "2 2 ^ ~ end");
    assert_eq!(ir("2^-x"), "2 $0 ~ ^ end");
    assert_eq!(ir("-x+1"), "$0 ~ 1 + end");
    assert_eq!(ir("--x"), "$0 ~ ~ end");
}

#[test]
fn test_groups() {
    assert_eq!(ir("(1+2)*3"), "1 2 + 3 * end");
    assert_eq!(ir(" ( ( y ) ) "), "$1 end");
}

#[test]
fn test_implicit_multiplication() {
    assert_eq!(ir("2x"), "2 $0 * end");
    assert_eq!(ir("2(x+1)"), "2 $0 1 + * end");
    assert_eq!(ir("(2+2)2"), "2 2 + 2 * end");
    assert_eq!(ir("x y"), "$0 $1 * end");
    assert_eq!(ir("2sin(x)"), "2 ( $0 )call/1[1] * end");
    assert_eq!(ir("2x^2"), "2 $0 2 ^ * end");
}

#[test]
fn test_implicit_multiplication_disabled() {
    let settings = explicit_only();
    assert_eq!(
        err_with("(2+2)2", &settings),
        (SyntaxErrorKind::MissingOperator, 5, 1)
    );
    assert_eq!(err_with("2x", &settings), (SyntaxErrorKind::MissingOperator, 1, 1));
    assert_eq!(err_with("x(1)", &settings), (SyntaxErrorKind::MissingOperator, 1, 1));
}

#[test]
fn test_hex_prefix_without_digits_before_identifier() {
    // `0x` needs a hex digit, so `0` is the literal and `xin` a call.
    assert_eq!(ir("0xin(1)"), "0 ( 1 )call/1[1] * end");
    assert_eq!(ir("0x"), "0 $0 * end");
    assert_eq!(ir("0xff"), "255 end");
}

#[test]
fn test_number_after_number_is_an_error() {
    assert_eq!(err("2 3"), (SyntaxErrorKind::MissingOperator, 2, 1));
}

#[test]
fn test_calls() {
    assert_eq!(ir("sin(x)"), "( $0 )call/1[1] end");
    assert_eq!(ir("max(1, 2)"), "( 1 , 2 )call/2[2] end");
    assert_eq!(ir("max(1,2,3)"), "( 1 , 2 , 3 )call/3[1+] end");
    assert_eq!(ir("max(7)"), "( 7 )call/1[1+] end");
    assert_eq!(ir("f()"), "( )call/0[0] end");
    assert_eq!(ir("sin (x)"), "( $0 )call/1[1] end");
    assert_eq!(
        ir("max(1+x, sin(y))"),
        "( 1 $0 + , ( $1 )call/1[1] )call/2[2] end"
    );
}

#[test]
fn test_call_errors() {
    assert_eq!(err("max(1,)"), (SyntaxErrorKind::MisplacedSeparator, 5, 1));
    assert_eq!(err("max(,1)"), (SyntaxErrorKind::MisplacedSeparator, 4, 1));
    assert_eq!(err("max(1,,2)"), (SyntaxErrorKind::MisplacedSeparator, 5, 1));
    assert_eq!(
        err("sin x"),
        (SyntaxErrorKind::MissingCallBrace("sin".into()), 0, 3)
    );
    assert_eq!(
        err("sin(1, 2)"),
        (
            SyntaxErrorKind::WrongArgumentCount {
                name: "sin".into(),
                count: 2
            },
            0,
            9
        )
    );
    assert_eq!(err("max()"), (SyntaxErrorKind::WrongArgumentCount {
        name: "max".into(),
        count: 0
    }, 0, 5));
    assert_eq!(err("sin(1"), (SyntaxErrorKind::UnmatchedOpeningBrace, 3, 1));
}

#[test]
fn test_comma_decimal_culture() {
    let settings = ParseSettings {
        culture: Culture::COMMA_DECIMAL,
        ..ParseSettings::default()
    };
    assert_eq!(
        parse_with("max(1,5; 2)", &settings, false).unwrap(),
        "( 1.5 , 2 )call/2[2] end"
    );
    assert_eq!(
        err_with("max(1;)", &settings),
        (SyntaxErrorKind::MisplacedSeparator, 5, 1)
    );
}

#[test]
fn test_value_and_function_with_the_same_name() {
    // `k` is both the constant 2 and a unary function.
    assert_eq!(ir("k"), "2 end");
    assert_eq!(ir("k + 1"), "2 1 + end");
    assert_eq!(ir("k(3)"), "2 3 * end");
    assert_eq!(
        parse_with("k(3)", &explicit_only(), false).unwrap(),
        "( 3 )call/1[1] end"
    );
    assert_eq!(
        err("k(3, 4)"),
        (
            SyntaxErrorKind::WrongArgumentCount {
                name: "k".into(),
                count: 2
            },
            0,
            7
        )
    );
}

#[test]
fn test_ignore_case() {
    let settings = ParseSettings::default();
    assert_eq!(parse_with("SIN(Y)", &settings, true).unwrap(), "( $1 )call/1[1] end");
    let err = parse_with("x", &settings, true).unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::AmbiguousIdentifier("x".into()));
    // Case-sensitive lookup keeps them apart.
    assert_eq!(ir("x + X"), "$0 7 + end");
}

#[test]
fn test_structural_errors() {
    assert_eq!(err(""), (SyntaxErrorKind::EmptyExpression, 0, 0));
    assert_eq!(err("   "), (SyntaxErrorKind::EmptyExpression, 0, 3));
    assert_eq!(err("2+"), (SyntaxErrorKind::MissingOperand('+'), 1, 1));
    assert_eq!(err("(2*)"), (SyntaxErrorKind::MissingOperand('*'), 2, 1));
    assert_eq!(err("-"), (SyntaxErrorKind::MissingOperand('-'), 0, 1));
    assert_eq!(err("()"), (SyntaxErrorKind::EmptyBraces, 0, 2));
    assert_eq!(err("(1"), (SyntaxErrorKind::UnmatchedOpeningBrace, 0, 1));
    assert_eq!(err("1)"), (SyntaxErrorKind::UnmatchedClosingBrace, 1, 1));
    assert_eq!(err("+1"), (SyntaxErrorKind::UnaryPlus, 0, 1));
    assert_eq!(err("*1"), (SyntaxErrorKind::MisplacedOperator('*'), 0, 1));
    assert_eq!(err("1,2"), (SyntaxErrorKind::SeparatorOutsideCall, 1, 1));
    assert_eq!(err("2 # 3"), (SyntaxErrorKind::UnexpectedCharacter('#'), 2, 1));
    assert_eq!(
        err("y+z"),
        (SyntaxErrorKind::UnknownIdentifier("z".into()), 2, 1)
    );
}

#[test]
fn test_nesting_limit() {
    let deep = format!("{}1{}", "(".repeat(300), ")".repeat(300));
    assert_eq!(err(&deep), (SyntaxErrorKind::TooDeep(256), 256, 1));

    let fine = format!("{}1{}", "(".repeat(200), ")".repeat(200));
    assert_eq!(ir(&fine), "1 end");
}

#[test]
fn test_error_snippet() {
    let err = parse_with("1 + foo", &ParseSettings::default(), false).unwrap_err();
    assert_eq!(err.snippet(), "foo");
    assert_eq!(err.to_string(), "unknown identifier 'foo' at position 4");
}

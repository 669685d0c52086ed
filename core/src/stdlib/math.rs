//! Math constants and functions.
//!
//! Constants: pi, e, tau, inf, nan
//! Functions: abs, sign, sqrt, cbrt, exp, ln, log10, log (1 or 2 args),
//!            sin, cos, tan, asin, acos, atan, atan2, sinh, cosh, tanh,
//!            floor, ceil, round, trunc, pow, min, max, sum, avg
//!
//! Fixed-arity functions are plain `extern "C"` functions so native code
//! calls them directly. The variadic ones are closures.

use crate::symbols::{Constants, FunctionItem, Functions, RegistrationError};

pub fn register_math_constants(constants: &mut Constants) -> Result<(), RegistrationError> {
    constants.insert("pi", core::f64::consts::PI)?;
    constants.insert("e", core::f64::consts::E)?;
    constants.insert("tau", core::f64::consts::TAU)?;
    constants.insert("inf", f64::INFINITY)?;
    constants.insert("nan", f64::NAN)?;
    Ok(())
}

pub fn register_math_functions(functions: &mut Functions) -> Result<(), RegistrationError> {
    let unary: [(&str, extern "C" fn(f64) -> f64); 21] = [
        ("abs", math_abs),
        ("sign", math_sign),
        ("sqrt", math_sqrt),
        ("cbrt", math_cbrt),
        ("exp", math_exp),
        ("ln", math_ln),
        ("log", math_ln),
        ("log10", math_log10),
        ("sin", math_sin),
        ("cos", math_cos),
        ("tan", math_tan),
        ("asin", math_asin),
        ("acos", math_acos),
        ("atan", math_atan),
        ("sinh", math_sinh),
        ("cosh", math_cosh),
        ("tanh", math_tanh),
        ("floor", math_floor),
        ("ceil", math_ceil),
        ("round", math_round),
        ("trunc", math_trunc),
    ];
    for (name, f) in unary {
        functions.add(name, FunctionItem::unary(f))?;
    }

    let binary: [(&str, extern "C" fn(f64, f64) -> f64); 5] = [
        ("log", math_log_base),
        ("atan2", math_atan2),
        ("pow", math_pow),
        ("min", math_min),
        ("max", math_max),
    ];
    for (name, f) in binary {
        functions.add(name, FunctionItem::binary(f))?;
    }

    functions.add("min", FunctionItem::variadic(1, |fixed, tail| fold(fixed[0], tail, f64::min)))?;
    functions.add("max", FunctionItem::variadic(1, |fixed, tail| fold(fixed[0], tail, f64::max)))?;
    functions.add("sum", FunctionItem::variadic(0, |_, tail| tail.iter().sum()))?;
    functions.add(
        "avg",
        FunctionItem::variadic(1, |fixed, tail| {
            let total = fixed[0] + tail.iter().sum::<f64>();
            total / (1 + tail.len()) as f64
        }),
    )?;
    Ok(())
}

fn fold(first: f64, rest: &[f64], f: fn(f64, f64) -> f64) -> f64 {
    rest.iter().fold(first, |acc, value| f(acc, *value))
}

extern "C" fn math_abs(value: f64) -> f64 {
    value.abs()
}

/// -1, 0 or 1; NaN stays NaN.
extern "C" fn math_sign(value: f64) -> f64 {
    if value == 0.0 || value.is_nan() {
        value
    } else {
        value.signum()
    }
}

extern "C" fn math_sqrt(value: f64) -> f64 {
    value.sqrt()
}

extern "C" fn math_cbrt(value: f64) -> f64 {
    value.cbrt()
}

extern "C" fn math_exp(value: f64) -> f64 {
    value.exp()
}

extern "C" fn math_ln(value: f64) -> f64 {
    value.ln()
}

extern "C" fn math_log10(value: f64) -> f64 {
    value.log10()
}

extern "C" fn math_log_base(value: f64, base: f64) -> f64 {
    value.ln() / base.ln()
}

extern "C" fn math_sin(value: f64) -> f64 {
    value.sin()
}

extern "C" fn math_cos(value: f64) -> f64 {
    value.cos()
}

extern "C" fn math_tan(value: f64) -> f64 {
    value.tan()
}

extern "C" fn math_asin(value: f64) -> f64 {
    value.asin()
}

extern "C" fn math_acos(value: f64) -> f64 {
    value.acos()
}

extern "C" fn math_atan(value: f64) -> f64 {
    value.atan()
}

extern "C" fn math_atan2(y: f64, x: f64) -> f64 {
    y.atan2(x)
}

extern "C" fn math_sinh(value: f64) -> f64 {
    value.sinh()
}

extern "C" fn math_cosh(value: f64) -> f64 {
    value.cosh()
}

extern "C" fn math_tanh(value: f64) -> f64 {
    value.tanh()
}

extern "C" fn math_floor(value: f64) -> f64 {
    value.floor()
}

extern "C" fn math_ceil(value: f64) -> f64 {
    value.ceil()
}

/// Half-way cases round away from zero.
extern "C" fn math_round(value: f64) -> f64 {
    value.round()
}

extern "C" fn math_trunc(value: f64) -> f64 {
    value.trunc()
}

extern "C" fn math_pow(base: f64, exponent: f64) -> f64 {
    crate::ir::pow(base, exponent)
}

extern "C" fn math_min(a: f64, b: f64) -> f64 {
    a.min(b)
}

extern "C" fn math_max(a: f64, b: f64) -> f64 {
    a.max(b)
}

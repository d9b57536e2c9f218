//! Tests for standard functions.

use assert_matches::assert_matches;

use formula_eval::{ArithmeticError, Engine, ErrorKind, Value};

use super::{evaluate, number, try_evaluate, vars};

#[test]
fn aggregates() {
    assert_eq!(evaluate("max(1, 2, 3) - min(3, 2, sum(1, 2, 3))"), Value::from(1));
    assert_eq!(evaluate("max(-1)"), Value::from(-1));
    assert_eq!(evaluate("sum(0.1, 0.2, 0.3)"), number("0.6"));
    assert_eq!(evaluate("MIN(2.5, 2.25)"), number("2.25"));

    let err = try_evaluate(r#"max(1, "2")"#).unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnsupportedTypes);
}

#[test]
fn aggregates_require_arguments() {
    let err = Engine::new().prepare("max()").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Syntax(_));
}

#[test]
fn rounding_functions() {
    assert_eq!(evaluate("abs(-2.5)"), number("2.5"));
    assert_eq!(evaluate("floor(-2.5)"), Value::from(-3));
    assert_eq!(evaluate("ceiling(-2.5)"), Value::from(-2));
    assert_eq!(evaluate("round(2.5)"), Value::from(2));
    assert_eq!(evaluate("round(3.5)"), Value::from(4));
    assert_eq!(evaluate("round(3.14159, 2)"), number("3.14"));
    assert_eq!(evaluate("round(1234, -2)"), Value::from(1200));

    let err = try_evaluate("round(1, 0.5)").unwrap_err();
    assert_eq!(err.kind().to_string(), "value is not an integer: 0.5");
}

#[test]
fn rounding_to_extreme_scales() {
    assert_eq!(evaluate("round(1, 10000000000)"), Value::from(1));
    assert_eq!(evaluate("round(0.25, 10000000000)"), number("0.25"));
    assert_eq!(evaluate("round(123.45, -5000)"), Value::from(0));

    let err = try_evaluate("round(1, -100000)").unwrap_err();
    assert_matches!(
        err.kind(),
        ErrorKind::Arithmetic(ArithmeticError::ScaleOutOfRange(-100_000))
    );
    assert_eq!(err.text(), "round");
}

#[test]
fn sqrt_and_log() {
    assert_eq!(evaluate("sqrt(16)"), Value::from(4));
    assert_eq!(evaluate("sqrt(0)"), Value::from(0));
    assert_eq!(evaluate("log(1)"), Value::from(0));
    let ln_e = evaluate("round(log(e), 10)");
    assert_eq!(ln_e, Value::from(1));

    let err = try_evaluate("sqrt(-1)").unwrap_err();
    assert_eq!(err.kind().to_string(), "value is not >= 0: -1");
    let err = try_evaluate("log(0)").unwrap_err();
    assert_eq!(err.kind().to_string(), "value is not > 0: 0");
    assert_eq!(err.text(), "log");
}

#[test]
fn conditional_evaluates_selected_branch_only() {
    assert_eq!(evaluate("if(1 < 2, 10, 1 / 0)"), Value::from(10));
    assert_eq!(evaluate("IF(1 > 2, missing, \"else\")"), Value::from("else"));

    let err = try_evaluate("if(1 > 2, 1, missing)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UndefinedVariable(name) if name == "missing");
    let err = try_evaluate("if(1, 2, 3)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnsupportedTypes);
}

#[test]
fn coalesce_stops_at_first_non_null() {
    assert_eq!(evaluate("coalesce(null, 2, missing)"), Value::from(2));
    assert_eq!(evaluate("coalesce(null, null)"), Value::Null);

    let engine = Engine::new();
    let vars = vars([("a", Value::Null), ("b", Value::from("b"))]);
    assert_eq!(engine.evaluate("coalesce(a, b)", &vars).unwrap(), Value::from("b"));
}

#[test]
fn not_function() {
    assert_eq!(evaluate("not(1 == 2)"), Value::Bool(true));
    assert_eq!(evaluate("NOT(true) || !false"), Value::Bool(true));
}

#[test]
fn function_names_are_case_insensitive() {
    assert_eq!(evaluate("Max(1, 5) + SUM(1) + abs(-1)"), Value::from(7));
}

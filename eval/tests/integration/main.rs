//! Integration tests for the evaluator.

use assert_matches::assert_matches;

use std::collections::HashMap;

use formula_eval::{ArithmeticError, BigDecimal, Engine, Error, ErrorKind, Value};

mod datetime;
mod functions;
mod layering;

fn number(s: &str) -> Value {
    Value::Number(s.parse::<BigDecimal>().unwrap())
}

fn try_evaluate(source: &str) -> Result<Value, Error> {
    Engine::new().evaluate(source, &())
}

fn evaluate(source: &str) -> Value {
    try_evaluate(source).unwrap_or_else(|err| panic!("failed evaluating `{source}`: {err}"))
}

fn vars(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> HashMap<String, Value> {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}

#[test]
fn precedence_and_associativity() {
    assert_eq!(evaluate("1 + 2 * 3"), Value::from(7));
    assert_eq!(evaluate("(1 + 2) * 3"), Value::from(9));
    assert_eq!(evaluate("1 - 2 - 3"), Value::from(-4));
    assert_eq!(evaluate("2 ^ 3 ^ 2"), Value::from(512));
    assert_eq!(evaluate("12 / 4 / 3"), Value::from(1));
    assert_eq!(evaluate("7 % 4 * 2"), Value::from(6));
}

#[test]
fn prefix_minus_binds_tighter_than_power() {
    assert_eq!(evaluate("-2^2"), Value::from(4));
    assert_eq!(evaluate("-(2^2)"), Value::from(-4));
    assert_eq!(evaluate("2 - -3"), Value::from(5));
    assert_eq!(evaluate("+5 - 1"), Value::from(4));
}

#[test]
fn decimal_arithmetic() {
    assert_eq!(evaluate("0.1 + 0.2"), number("0.3"));
    assert_eq!(evaluate("1 / 4"), number("0.25"));
    assert_eq!(evaluate("2 ^ -2"), number("0.25"));
    assert_eq!(evaluate("0x10 + 1.5e1"), Value::from(31));
    assert_eq!(evaluate(".5 * 4"), Value::from(2));

    let third = evaluate("1 / 3").to_string();
    assert_eq!(third.len(), "0.".len() + 68, "{third}");
    assert!(third.chars().skip(2).all(|ch| ch == '3'));
}

#[test]
fn numbers_are_displayed_without_padding() {
    assert_eq!(evaluate("1 + 2").to_string(), "3");
    assert_eq!(evaluate("10 / 4").to_string(), "2.5");
    assert_eq!(evaluate("sqrt(16)").to_string(), "4");
    assert_eq!(evaluate("2 ^ 10").to_string(), "1024");
    assert_eq!(evaluate("1.50 * 2").to_string(), "3.00");
}

#[test]
fn empty_arguments_are_rejected() {
    for source in ["max(1,,2)", "max(,1)", "max(1,)", "round(2.5,)"] {
        let err = try_evaluate(source).unwrap_err();
        assert_matches!(
            err.kind(),
            ErrorKind::Syntax(formula_parser::ErrorKind::EmptyArgument),
            "{source}"
        );
    }
    assert_eq!(evaluate("max(1, 2)"), Value::from(2));
}

#[test]
fn out_of_range_literals() {
    let err = try_evaluate("1e1000000000 + 1").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::InvalidLiteral(text) if text == "1e1000000000");
    assert_eq!(err.text(), "1e1000000000");
    assert_eq!(evaluate("floor(1e-10000)"), Value::from(0));
}

#[test]
fn division_by_zero() {
    for source in ["3 / 0", "3 % 0", "1 / (2 - 2)"] {
        let err = try_evaluate(source).unwrap_err();
        assert_matches!(
            err.kind(),
            ErrorKind::Arithmetic(ArithmeticError::DivisionByZero)
        );
        assert!(err.to_string().ends_with("Division by zero"), "{err}");
    }

    let err = try_evaluate("0 ^ -1").unwrap_err();
    assert_matches!(
        err.kind(),
        ErrorKind::Arithmetic(ArithmeticError::ZeroToNegativePower)
    );
}

#[test]
fn comparisons_and_logic() {
    assert_eq!(evaluate("1 < 2 && 2 <= 2"), Value::Bool(true));
    assert_eq!(evaluate(r#""abc" > "abd""#), Value::Bool(false));
    assert_eq!(evaluate("1 == 1.000"), Value::Bool(true));
    assert_eq!(evaluate(r#"1 != "1""#), Value::Bool(true));
    assert_eq!(evaluate("!(1 > 2) || false"), Value::Bool(true));
    assert_eq!(evaluate("null == NULL"), Value::Bool(true));
}

#[test]
fn short_circuiting_operators() {
    // The right operand would fail if it were evaluated.
    assert_eq!(evaluate("false && missing"), Value::Bool(false));
    assert_eq!(evaluate("true || 1 / 0 > 0"), Value::Bool(true));

    let err = try_evaluate("true && missing").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UndefinedVariable(name) if name == "missing");
    let err = try_evaluate("true && 1").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnsupportedTypes);
}

#[test]
fn string_concatenation() {
    assert_eq!(evaluate(r#""total: " + 2 * 3"#), Value::from("total: 6"));
    assert_eq!(evaluate(r#"true + "!""#), Value::from("true!"));
    assert_eq!(evaluate(r#""a\tb" + "\"""#), Value::from("a\tb\""));
}

#[test]
fn unsupported_types() {
    let err = try_evaluate("1 + true").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnsupportedTypes);
    assert_eq!(err.to_string(), "1:3: Unsupported data types in operation");
    assert_eq!(err.text(), "+");

    let err = try_evaluate("-true").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnsupportedTypes);
}

#[test]
fn undefined_variable() {
    let err = try_evaluate("1 + x").unwrap_err();
    assert_eq!(err.to_string(), "1:5: Variable or constant value for 'x' not found");
    assert_eq!((err.start(), err.end()), (4, 5));
}

#[test]
fn structure_access() {
    let engine = Engine::new();
    let structure: Value = [("b", 99)]
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect();
    let vars = vars([("a", structure)]);
    assert_eq!(engine.evaluate("a.b", &vars).unwrap(), Value::from(99));
    assert_eq!(engine.evaluate(r#"a{"b"} + 1"#, &vars).unwrap(), Value::from(100));

    let err = engine.evaluate("a.c", &vars).unwrap_err();
    assert_eq!(err.kind().to_string(), "Field 'c' not found in structure");
    let err = engine.evaluate(r#"a{"c"}"#, &vars).unwrap_err();
    assert_matches!(err.kind(), ErrorKind::FieldNotFound(name) if name == "c");

    let vars = HashMap::from([("a".to_owned(), Value::from(1))]);
    let err = engine.evaluate("a.b", &vars).unwrap_err();
    assert_eq!(
        err.kind().to_string(),
        "Value of wrong type for structure access: NUMBER"
    );
}

#[test]
fn array_access() {
    let engine = Engine::new();
    let vars = vars([("a", Value::from(vec![Value::from("first")]))]);
    assert_eq!(engine.evaluate("a[0]", &vars).unwrap(), Value::from("first"));
    assert_eq!(engine.evaluate("a[2 - 2.0]", &vars).unwrap(), Value::from("first"));

    let err = engine.evaluate("a[1]", &vars).unwrap_err();
    assert_eq!(
        err.kind().to_string(),
        "Index 1 is out of bounds for array of length 1"
    );
    let err = engine.evaluate("a[0.5]", &vars).unwrap_err();
    assert_matches!(err.kind(), ErrorKind::InvalidArgument(msg) if msg.contains("integer"));

    let vars = HashMap::from([("a".to_owned(), Value::from(5))]);
    let err = engine.evaluate("a[0]", &vars).unwrap_err();
    assert_eq!(err.kind().to_string(), "Unsupported data types in operation");
}

#[test]
fn arity_errors_are_syntax_errors() {
    let err = Engine::new().prepare("round()").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Syntax(_));
    let message = err.kind().to_string();
    assert!(message.contains("round") && message.contains('0'), "{message}");

    let err = Engine::new().prepare("undefined_fn(1)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Syntax(_));
}

#[test]
fn expressions_are_reusable() {
    let expr = Engine::new().prepare("x * 2").unwrap();
    for i in 0..5 {
        let vars = vars([("x", Value::from(i))]);
        assert_eq!(expr.evaluate(&vars).unwrap(), Value::from(i * 2));
    }
}

#[test]
fn expressions_can_be_evaluated_concurrently() {
    let expr = Engine::new().prepare("sum(x, 1, 2)").unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let expr = &expr;
                scope.spawn(move || {
                    let vars = |name: &str| (name == "x").then(|| Value::from(i));
                    expr.evaluate(&vars).unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let i = i32::try_from(i).unwrap();
            assert_eq!(handle.join().unwrap(), Value::from(i + 3));
        }
    });
}

#[test]
fn parsing_is_idempotent() {
    let engine = Engine::new();
    let source = "max(1, 2, 3) - min(3, 2, sum(1, 2, 3))";
    let first = engine.parse(source).unwrap();
    let second = engine.parse(source).unwrap();
    assert_eq!(first, second);

    // Canonical rendering parses back to the same tree.
    let rendered = first.to_string();
    let reparsed = engine.parse(&rendered).unwrap();
    assert!(first.same_structure(&reparsed), "{rendered}");
    assert_eq!(
        engine.evaluate(source, &()).unwrap(),
        engine.evaluate(&rendered, &()).unwrap()
    );
}

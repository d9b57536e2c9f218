//! Tests for host-defined operators, functions and variable resolvers.

use assert_matches::assert_matches;

use std::{
    error::Error as StdError,
    sync::atomic::{AtomicUsize, Ordering},
};

use formula_eval::{
    fns::{take_args, ArithmeticOp},
    Argument, CallContext, Engine, Error, ErrorKind, FunctionTable, NativeFn, Param, Signature,
    Validator, Value, ValueType, VariableResolver,
};
use formula_parser::{precedence, OperatorMapping, OperatorRole, OperatorTable};

use super::{number, vars};

fn hypot(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x, y] = take_args(args, ctx)?;
    let (Value::Number(x), Value::Number(y)) = (x.into_value()?, y.into_value()?) else {
        return Err(ctx.unsupported_types());
    };
    let sum = &x * &x + &y * &y;
    let root = sum.sqrt().ok_or_else(|| ctx.unsupported_types())?;
    Ok(Value::Number(ctx.arithmetic().round_to_precision(&root)))
}

#[test]
fn host_function_overrides_standard_one() {
    let functions = FunctionTable::new().with(
        "max",
        Signature::new([Param::number(), Param::number()]),
        hypot,
    );
    let engine = Engine::new().with_functions(functions);

    // Two-argument calls are served by the host table...
    assert_eq!(engine.evaluate("max(3, 4)", &()).unwrap(), Value::from(5));
    // ...while other arities fall back to the standard table.
    assert_eq!(engine.evaluate("max(3, 4, 1)", &()).unwrap(), Value::from(4));
}

fn percent(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x] = take_args(args, ctx)?;
    let args = vec![x, Argument::Value(Value::from(100))];
    ArithmeticOp::Div.evaluate(args, ctx)
}

#[test]
fn host_operators() {
    let operators = OperatorTable::new()
        .with(
            OperatorRole::Infix,
            "**",
            OperatorMapping::new(precedence::POWER, "infix ^").right_associative(),
        )
        .with(
            OperatorRole::Postfix,
            "%",
            OperatorMapping::new(precedence::UNARY, "postfix %"),
        );
    let functions = FunctionTable::new().with(
        "postfix %",
        Signature::new([Param::number()]),
        percent,
    );
    let engine = Engine::new()
        .with_operators(operators)
        .with_functions(functions);

    assert_eq!(engine.evaluate("2 ** 3 ** 2", &()).unwrap(), Value::from(512));
    assert_eq!(engine.evaluate("50% * 8", &()).unwrap(), Value::from(4));
    assert_eq!(engine.evaluate("(20 + 5)%", &()).unwrap(), number("0.25"));
}

#[test]
fn mapped_operator_without_implementation() {
    let operators = OperatorTable::new().with(
        OperatorRole::Prefix,
        "~",
        OperatorMapping::new(precedence::UNARY, "prefix ~"),
    );
    let engine = Engine::new().with_operators(operators);
    let err = engine.prepare("~1").unwrap_err();
    assert_eq!(err.to_string(), "1:1: could not find prefix operator '~'");
}

#[test]
fn validation_failures_are_collected() {
    let functions = FunctionTable::new().with(
        "CHECKED",
        Signature::new([
            Param::number().validated(Validator::positive()),
            Param::number()
                .validated(Validator::integer())
                .validated(Validator::non_negative()),
        ]),
        ArithmeticOp::Add,
    );
    let engine = Engine::new().with_functions(functions);

    assert_eq!(engine.evaluate("checked(1, 2)", &()).unwrap(), Value::from(3));

    let err = engine.evaluate("checked(-1, -0.5)", &()).unwrap_err();
    assert_eq!(err.kind().to_string(), "value is not > 0: -1");
    let secondary: Vec<_> = err.secondary().iter().map(ToString::to_string).collect();
    assert_eq!(
        secondary,
        ["value is not an integer: -0.5", "value is not >= 0: -0.5"]
    );
    assert_eq!(err.text(), "checked");
}

/// Function returning a fixed label.
#[derive(Debug)]
struct Label(&'static str);

impl NativeFn for Label {
    fn evaluate(&self, _args: Vec<Argument<'_>>, _ctx: &CallContext<'_>) -> Result<Value, Error> {
        Ok(Value::from(self.0))
    }
}

#[test]
fn first_matching_overload_is_authoritative() {
    // The second overload would accept the argument, but the first one matches by type.
    let functions = FunctionTable::new()
        .with(
            "pick",
            Signature::new([Param::number().validated(Validator::positive())]),
            Label("positive"),
        )
        .with("pick", Signature::new([Param::number()]), Label("any"))
        .with(
            "pick",
            Signature::new([Param::of(ValueType::String)]),
            Label("string"),
        );
    let engine = Engine::new().with_functions(functions);

    assert_eq!(engine.evaluate("pick(1)", &()).unwrap(), Value::from("positive"));
    assert_eq!(engine.evaluate(r#"pick("1")"#, &()).unwrap(), Value::from("string"));
    let err = engine.evaluate("pick(-1)", &()).unwrap_err();
    assert_matches!(err.kind(), ErrorKind::InvalidArgument(_));
    let err = engine.evaluate("pick(true)", &()).unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnsupportedTypes);
}

static EVALUATED_ARGS: AtomicUsize = AtomicUsize::new(0);

fn counting_resolver(name: &str) -> Option<Value> {
    EVALUATED_ARGS.fetch_add(1, Ordering::SeqCst);
    (name == "x").then(|| Value::from(1))
}

fn first_lazy(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [first, _second] = take_args(args, ctx)?;
    assert_matches!(first, Argument::Lazy(_));
    first.into_value()
}

#[test]
fn lazy_host_function() {
    let functions = FunctionTable::new().with(
        "FIRST",
        Signature::new([Param::any().lazy(), Param::any().lazy()]),
        first_lazy,
    );
    let engine = Engine::new().with_functions(functions);
    let expr = engine.prepare("first(x, y)").unwrap();

    EVALUATED_ARGS.store(0, Ordering::SeqCst);
    assert_eq!(expr.evaluate(&counting_resolver).unwrap(), Value::from(1));
    assert_eq!(EVALUATED_ARGS.load(Ordering::SeqCst), 1);
}

#[derive(Debug)]
struct RateUnavailable;

impl std::fmt::Display for RateUnavailable {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("exchange rate service is unavailable")
    }
}

impl StdError for RateUnavailable {}

fn failing_rate(_args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let err = ctx.call_site_error(ErrorKind::native("cannot fetch rate"));
    Err(err.with_cause(RateUnavailable))
}

#[test]
fn native_errors_with_cause() {
    let functions = FunctionTable::new().with(
        "RATE",
        Signature::new([Param::of(ValueType::String)]),
        failing_rate,
    );
    let engine = Engine::new().with_functions(functions);
    let err = engine.evaluate(r#"2 * rate("EUR")"#, &()).unwrap_err();

    assert_eq!(err.to_string(), "1:5: cannot fetch rate");
    let source = err.source().unwrap();
    assert_eq!(source.to_string(), "exchange rate service is unavailable");
}

#[test]
fn layered_variable_resolvers() {
    let defaults = vars([("rate", number("0.5")), ("amount", Value::from(10))]);
    let overrides = vars([("amount", Value::from(4))]);
    let resolver = overrides.and_then(defaults);

    let engine = Engine::new();
    let value = engine.evaluate("amount * rate", &resolver).unwrap();
    assert_eq!(value, Value::from(2));
}

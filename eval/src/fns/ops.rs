//! Implementations of the standard operators.

use core::cmp::Ordering;

use super::{
    expect_bool, expect_number, take_args, Argument, CallContext, NativeFn, Param, Signature,
};
use crate::{
    arith::Arithmetic,
    error::{Error, ErrorKind},
    registry::FunctionTable,
    values::{Value, ValueType},
};
use formula_parser::{OperatorRole, OperatorTable};

/// Arithmetic operation on two numbers performed with the context
/// [`DecimalArithmetic`](crate::DecimalArithmetic).
///
/// # Type
///
/// ```text
/// (NUMBER, NUMBER) -> NUMBER
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArithmeticOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder.
    Rem,
    /// Exponentiation.
    Pow,
}

impl NativeFn for ArithmeticOp {
    fn evaluate(&self, args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
        let [x, y] = take_args(args, ctx)?;
        let x = expect_number(x, ctx)?;
        let y = expect_number(y, ctx)?;

        let arithmetic = ctx.arithmetic();
        let result = match self {
            Self::Add => arithmetic.add(x, y),
            Self::Sub => arithmetic.sub(x, y),
            Self::Mul => arithmetic.mul(x, y),
            Self::Div => arithmetic.div(x, y),
            Self::Rem => arithmetic.rem(x, y),
            Self::Pow => arithmetic.pow(x, y),
        };
        result
            .map(Value::Number)
            .map_err(|err| ctx.call_site_error(err))
    }
}

/// Order comparison of two values of the same type, as per [`Value::compare()`].
///
/// # Type
///
/// ```text
/// ('T, 'T) -> BOOLEAN
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
}

impl Compare {
    fn matches(self, ordering: Ordering) -> bool {
        match self {
            Self::Less => ordering.is_lt(),
            Self::LessOrEqual => ordering.is_le(),
            Self::Greater => ordering.is_gt(),
            Self::GreaterOrEqual => ordering.is_ge(),
        }
    }
}

impl NativeFn for Compare {
    fn evaluate(&self, args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
        let [x, y] = take_args(args, ctx)?;
        let x = x.into_value()?;
        let y = y.into_value()?;
        let ordering = x.compare(&y).ok_or_else(|| ctx.unsupported_types())?;
        Ok(Value::Bool(self.matches(ordering)))
    }
}

fn overflow(ctx: &CallContext<'_>) -> Error {
    ctx.call_site_error(ErrorKind::native("Date-time or duration overflow"))
}

fn add_time(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x, y] = take_args(args, ctx)?;
    let sum = match (x.into_value()?, y.into_value()?) {
        (Value::DateTime(timestamp), Value::Duration(duration)) => timestamp
            .checked_add_signed(duration)
            .map(Value::DateTime),
        (Value::Duration(x), Value::Duration(y)) => x.checked_add(&y).map(Value::Duration),
        _ => return Err(ctx.unsupported_types()),
    };
    sum.ok_or_else(|| overflow(ctx))
}

fn sub_time(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x, y] = take_args(args, ctx)?;
    let difference = match (x.into_value()?, y.into_value()?) {
        (Value::DateTime(x), Value::DateTime(y)) => {
            Some(Value::Duration(x.signed_duration_since(y)))
        }
        (Value::DateTime(timestamp), Value::Duration(duration)) => timestamp
            .checked_sub_signed(duration)
            .map(Value::DateTime),
        (Value::Duration(x), Value::Duration(y)) => x.checked_sub(&y).map(Value::Duration),
        _ => return Err(ctx.unsupported_types()),
    };
    difference.ok_or_else(|| overflow(ctx))
}

fn concat(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x, y] = take_args(args, ctx)?;
    let (x, y) = (x.into_value()?, y.into_value()?);
    Ok(Value::String(format!("{x}{y}")))
}

fn equal(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x, y] = take_args(args, ctx)?;
    Ok(Value::Bool(x.into_value()? == y.into_value()?))
}

fn not_equal(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x, y] = take_args(args, ctx)?;
    Ok(Value::Bool(x.into_value()? != y.into_value()?))
}

fn and(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x, y] = take_args(args, ctx)?;
    if !expect_bool(x, ctx)? {
        return Ok(Value::Bool(false));
    }
    expect_bool(y, ctx).map(Value::Bool)
}

fn or(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x, y] = take_args(args, ctx)?;
    if expect_bool(x, ctx)? {
        return Ok(Value::Bool(true));
    }
    expect_bool(y, ctx).map(Value::Bool)
}

fn negate(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x] = take_args(args, ctx)?;
    match x.into_value()? {
        Value::Number(x) => ctx
            .arithmetic()
            .neg(x)
            .map(Value::Number)
            .map_err(|err| ctx.call_site_error(err)),
        Value::Duration(duration) => Ok(Value::Duration(-duration)),
        _ => Err(ctx.unsupported_types()),
    }
}

fn identity(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x] = take_args(args, ctx)?;
    x.into_value()
}

pub(super) fn not(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [x] = take_args(args, ctx)?;
    expect_bool(x, ctx).map(|flag| Value::Bool(!flag))
}

fn binary(x: ValueType, y: ValueType) -> Signature {
    Signature::new([Param::of(x), Param::of(y)])
}

pub(super) fn define(table: &mut FunctionTable) {
    use ValueType::{Bool, DateTime, Duration, Number};

    let infix = |text: &str| OperatorTable::implementation_name(OperatorRole::Infix, text);
    let prefix = |text: &str| OperatorTable::implementation_name(OperatorRole::Prefix, text);

    let add = infix("+");
    table
        .define(&add, binary(Number, Number), ArithmeticOp::Add)
        .define(&add, binary(DateTime, Duration), add_time)
        .define(&add, binary(Duration, Duration), add_time)
        .define(&add, Signature::new([Param::of(ValueType::String), Param::any()]), concat)
        .define(&add, Signature::new([Param::any(), Param::of(ValueType::String)]), concat);

    let sub = infix("-");
    table
        .define(&sub, binary(Number, Number), ArithmeticOp::Sub)
        .define(&sub, binary(DateTime, DateTime), sub_time)
        .define(&sub, binary(DateTime, Duration), sub_time)
        .define(&sub, binary(Duration, Duration), sub_time);

    table
        .define(&infix("*"), binary(Number, Number), ArithmeticOp::Mul)
        .define(&infix("/"), binary(Number, Number), ArithmeticOp::Div)
        .define(&infix("%"), binary(Number, Number), ArithmeticOp::Rem)
        .define(&infix("^"), binary(Number, Number), ArithmeticOp::Pow);

    let any_pair = || Signature::new([Param::any(), Param::any()]);
    table
        .define(&infix("=="), any_pair(), equal)
        .define(&infix("!="), any_pair(), not_equal);

    let comparisons = [
        ("<", Compare::Less),
        ("<=", Compare::LessOrEqual),
        (">", Compare::Greater),
        (">=", Compare::GreaterOrEqual),
    ];
    for (text, comparison) in comparisons {
        let name = infix(text);
        for ty in [Number, ValueType::String, DateTime, Duration, Bool] {
            table.define(&name, binary(ty, ty), comparison);
        }
    }

    let short_circuit = || Signature::new([Param::of(Bool), Param::of(Bool).lazy()]);
    table
        .define(&infix("&&"), short_circuit(), and)
        .define(&infix("||"), short_circuit(), or);

    let neg = prefix("-");
    table
        .define(&neg, Signature::new([Param::number()]), negate)
        .define(&neg, Signature::new([Param::of(Duration)]), negate)
        .define(&prefix("+"), Signature::new([Param::number()]), identity)
        .define(&prefix("!"), Signature::new([Param::of(Bool)]), not);
}

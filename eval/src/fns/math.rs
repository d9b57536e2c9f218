//! Mathematical functions.

use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::{FromPrimitive, ToPrimitive};

use super::{
    expect_i64, expect_number, take_args, Argument, CallContext, NativeFn, Param, Signature,
    Validator,
};
use crate::{
    arith::{Arithmetic, DecimalArithmetic},
    error::{Error, ErrorKind},
    registry::FunctionTable,
    values::Value,
};

/// Aggregation over one or more numbers.
#[derive(Debug, Clone, Copy)]
enum Aggregate {
    Max,
    Min,
    Sum,
}

impl NativeFn for Aggregate {
    fn evaluate(&self, args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
        let mut numbers = args.into_iter().map(|arg| expect_number(arg, ctx));
        let mut acc = numbers.next().ok_or_else(|| ctx.unsupported_types())??;
        for number in numbers {
            let number = number?;
            acc = match self {
                Self::Max => acc.max(number),
                Self::Min => acc.min(number),
                Self::Sum => ctx
                    .arithmetic()
                    .add(acc, number)
                    .map_err(|err| ctx.call_site_error(err))?,
            };
        }
        Ok(Value::Number(acc))
    }
}

fn number_fn(
    ctx: &CallContext<'_>,
    args: Vec<Argument<'_>>,
    map: impl FnOnce(BigDecimal, &DecimalArithmetic) -> Option<BigDecimal>,
) -> Result<Value, Error> {
    let [x] = take_args(args, ctx)?;
    let x = expect_number(x, ctx)?;
    let message = format!("Cannot compute {} of {x}", ctx.name());
    map(x, ctx.arithmetic())
        .map(Value::Number)
        .ok_or_else(|| ctx.call_site_error(ErrorKind::native(message)))
}

fn abs(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    number_fn(ctx, args, |x, _| Some(x.abs()))
}

fn floor(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    number_fn(ctx, args, |x, _| {
        Some(DecimalArithmetic::round_integer(&x, RoundingMode::Floor))
    })
}

fn ceiling(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    number_fn(ctx, args, |x, _| {
        Some(DecimalArithmetic::round_integer(&x, RoundingMode::Ceiling))
    })
}

fn sqrt(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    number_fn(ctx, args, |x, arith| {
        x.sqrt().map(|root| arith.round_to_precision(&root))
    })
}

/// Natural logarithm. Computed in `f64`, so the result has at most 17 significant digits.
fn log(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    number_fn(ctx, args, |x, arith| {
        let log = x.to_f64()?.ln();
        BigDecimal::from_f64(log).map(|log| arith.round_to_precision(&log))
    })
}

fn round(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let mut args = args.into_iter();
    let x = args.next().ok_or_else(|| ctx.unsupported_types())?;
    let x = expect_number(x, ctx)?;
    let scale = match args.next() {
        Some(scale) => expect_i64(scale, ctx)?,
        None => 0,
    };
    ctx.arithmetic()
        .round(&x, scale)
        .map(Value::Number)
        .map_err(|err| ctx.call_site_error(err))
}

pub(super) fn define(table: &mut FunctionTable) {
    let numbers = || Signature::default().with_variadic(Param::number());
    table
        .define("MAX", numbers(), Aggregate::Max)
        .define("MIN", numbers(), Aggregate::Min)
        .define("SUM", numbers(), Aggregate::Sum);

    let unary = || Signature::new([Param::number()]);
    table
        .define("ABS", unary(), abs)
        .define("FLOOR", unary(), floor)
        .define("CEILING", unary(), ceiling)
        .define(
            "SQRT",
            Signature::new([Param::number().validated(Validator::non_negative())]),
            sqrt,
        )
        .define(
            "LOG",
            Signature::new([Param::number().validated(Validator::positive())]),
            log,
        );

    let scale = Param::number().validated(Validator::integer());
    table
        .define("ROUND", unary(), round)
        .define("ROUND", Signature::new([Param::number(), scale]), round);
}

//! Flow control and logic functions.

use super::{expect_bool, ops, take_args, Argument, CallContext, Param, Signature};
use crate::{
    error::Error,
    registry::FunctionTable,
    values::{Value, ValueType},
};

/// `IF(condition, then, else)`: evaluates only the selected branch.
fn if_fn(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [condition, then_branch, else_branch] = take_args(args, ctx)?;
    if expect_bool(condition, ctx)? {
        then_branch.into_value()
    } else {
        else_branch.into_value()
    }
}

/// `COALESCE(value, ...)`: returns the first non-null argument, evaluating arguments
/// left to right until one is found.
fn coalesce(args: Vec<Argument<'_>>, _ctx: &CallContext<'_>) -> Result<Value, Error> {
    for arg in args {
        let value = arg.into_value()?;
        if !value.is_null() {
            return Ok(value);
        }
    }
    Ok(Value::Null)
}

pub(super) fn define(table: &mut FunctionTable) {
    let if_signature = Signature::new([
        Param::of(ValueType::Bool),
        Param::any().lazy(),
        Param::any().lazy(),
    ]);
    table
        .define("IF", if_signature, if_fn)
        .define(
            "COALESCE",
            Signature::default().with_variadic(Param::any().lazy()),
            coalesce,
        )
        .define("NOT", Signature::new([Param::of(ValueType::Bool)]), ops::not);
}

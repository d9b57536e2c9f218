//! Array and associate indexing.

use num_traits::ToPrimitive;

use super::{take_args, Argument, CallContext, Param, Signature, Validator};
use crate::{
    error::{Error, ErrorKind},
    registry::FunctionTable,
    values::{Value, ValueType},
};

/// Implementation name for array indexing, `array[index]`. The name cannot be written
/// as a function call in expressions.
pub const ARRAY_INDEX: &str = "[]";
/// Implementation name for associate indexing, `structure{key}`.
pub const ASSOCIATE_INDEX: &str = "{}";

fn array_index(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [array, index] = take_args(args, ctx)?;
    let (Value::Array(mut array), Value::Number(index)) = (array.into_value()?, index.into_value()?)
    else {
        return Err(ctx.unsupported_types());
    };

    let position = index.to_usize().filter(|&i| i < array.len());
    if let Some(position) = position {
        Ok(array.swap_remove(position))
    } else {
        Err(ctx.call_site_error(ErrorKind::IndexOutOfBounds {
            index: index.to_string(),
            len: array.len(),
        }))
    }
}

fn associate_index(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [structure, key] = take_args(args, ctx)?;
    let (Value::Structure(mut fields), Value::String(key)) =
        (structure.into_value()?, key.into_value()?)
    else {
        return Err(ctx.unsupported_types());
    };
    fields
        .remove(&key)
        .ok_or_else(|| ctx.call_site_error(ErrorKind::FieldNotFound(key)))
}

pub(super) fn define(table: &mut FunctionTable) {
    let index = Param::number().validated(Validator::integer());
    table
        .define(
            ARRAY_INDEX,
            Signature::new([Param::of(ValueType::Array), index]),
            array_index,
        )
        .define(
            ASSOCIATE_INDEX,
            Signature::new([Param::of(ValueType::Structure), Param::of(ValueType::String)]),
            associate_index,
        );
}

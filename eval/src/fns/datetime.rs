//! Date-time and duration functions.

use chrono::{Duration, TimeZone, Utc};

use super::{expect_i64, take_args, Argument, CallContext, Param, Signature, Validator};
use crate::{
    error::{Error, ErrorKind},
    registry::FunctionTable,
    values::Value,
};

/// `DT_DATE_NEW(year, month, day[, hour, minute, second])` interpreted in the context zone.
/// Ambiguous local times (e.g., on a DST fall-back) resolve to the earlier instant.
fn date_new(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let mut parts = [0_i64; 6];
    let arg_count = args.len();
    for (part, arg) in parts.iter_mut().zip(args) {
        *part = expect_i64(arg, ctx)?;
    }
    if arg_count != 3 && arg_count != 6 {
        return Err(ctx.unsupported_types());
    }

    let [year, month, day, hour, minute, second] = parts;
    let invalid = || {
        let message = format!("Invalid date-time: {year}-{month}-{day} {hour}:{minute}:{second}");
        ctx.call_site_error(ErrorKind::native(message))
    };
    let year = i32::try_from(year).map_err(|_| invalid())?;
    let [month, day, hour, minute, second] =
        [month, day, hour, minute, second].map(|part| u32::try_from(part).unwrap_or(u32::MAX));

    let local = ctx
        .zone()
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .earliest()
        .ok_or_else(invalid)?;
    Ok(Value::DateTime(local.with_timezone(&Utc)))
}

/// `DT_DURATION_FROM_MILLIS(millis)`.
fn duration_from_millis(args: Vec<Argument<'_>>, ctx: &CallContext<'_>) -> Result<Value, Error> {
    let [millis] = take_args(args, ctx)?;
    let millis = expect_i64(millis, ctx)?;
    Duration::try_milliseconds(millis)
        .map(Value::Duration)
        .ok_or_else(|| {
            let message = format!("Duration of {millis} ms is out of range");
            ctx.call_site_error(ErrorKind::native(message))
        })
}

pub(super) fn define(table: &mut FunctionTable) {
    let integer = || Param::number().validated(Validator::integer());
    table
        .define("DT_DATE_NEW", Signature::new([integer(), integer(), integer()]), date_new)
        .define(
            "DT_DATE_NEW",
            Signature::new([
                integer(),
                integer(),
                integer(),
                integer(),
                integer(),
                integer(),
            ]),
            date_new,
        )
        .define(
            "DT_DURATION_FROM_MILLIS",
            Signature::new([integer()]),
            duration_from_millis,
        );
}

//! Tests for date-time and duration support.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};

use formula_eval::{Engine, ErrorKind, EvaluationContext, Value};

use super::{evaluate, try_evaluate, vars};

#[test]
fn creating_date_times() {
    let value = evaluate("dt_date_new(2024, 1, 15)");
    let expected = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    assert_eq!(value, Value::DateTime(expected));
    assert_eq!(value.to_string(), "2024-01-15T00:00:00+00:00");

    let value = evaluate("DT_DATE_NEW(2024, 2, 29, 23, 59, 30)");
    let expected = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 30).unwrap();
    assert_eq!(value, Value::DateTime(expected));
}

#[test]
fn invalid_date_time() {
    let err = try_evaluate("dt_date_new(2023, 2, 29)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Native(msg) if msg.starts_with("Invalid date-time"));
    let err = try_evaluate("dt_date_new(2023, -1, 1)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Native(_));
    let err = try_evaluate("dt_date_new(2023, 1.5, 1)").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::InvalidArgument(_));
}

#[test]
fn date_time_arithmetic() {
    assert_eq!(
        evaluate("dt_date_new(2024, 3, 1) - dt_date_new(2024, 2, 28)"),
        Value::Duration(Duration::days(2))
    );
    assert_eq!(
        evaluate("dt_date_new(2024, 1, 1) + dt_duration_from_millis(90000)"),
        Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 30).unwrap())
    );
    assert_eq!(
        evaluate("dt_date_new(2024, 1, 1) - dt_duration_from_millis(1000)"),
        Value::DateTime(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap())
    );
    assert_eq!(
        evaluate("-dt_duration_from_millis(5) + dt_duration_from_millis(7)"),
        Value::Duration(Duration::milliseconds(2))
    );
    assert_eq!(
        evaluate("dt_date_new(2024, 1, 1) < dt_date_new(2024, 1, 2)"),
        Value::Bool(true)
    );
    assert_eq!(
        evaluate("dt_duration_from_millis(1000) >= dt_duration_from_millis(999)"),
        Value::Bool(true)
    );

    let err = try_evaluate("dt_date_new(2024, 1, 1) + 1").unwrap_err();
    assert_matches!(err.kind(), ErrorKind::UnsupportedTypes);
}

#[test]
fn date_times_use_context_zone() {
    let context = EvaluationContext::default()
        .with_zone_id("Europe/Berlin")
        .unwrap();
    let engine = Engine::new().with_context(context);
    let value = engine
        .evaluate("dt_date_new(2024, 7, 1, 12, 0, 0)", &())
        .unwrap();
    // Berlin is at UTC+2 in summer.
    let expected = Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
    assert_eq!(value, Value::DateTime(expected));
}

#[test]
fn context_can_be_overridden_per_evaluation() {
    let expr = Engine::new().prepare("dt_date_new(2024, 1, 1, h, 0, 0)").unwrap();
    let vars = vars([("h", Value::from(12))]);
    let utc = expr.evaluate(&vars).unwrap();
    assert_eq!(
        utc,
        Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    );

    let tokyo = EvaluationContext::default()
        .with_zone_id("Asia/Tokyo")
        .unwrap();
    let value = expr.evaluate_in(&vars, &tokyo).unwrap();
    assert_eq!(
        value,
        Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap())
    );
    assert_eq!(expr.context(), &EvaluationContext::default());
}

#[test]
fn ambiguous_local_times_resolve_to_earlier_instant() {
    let context = EvaluationContext::default()
        .with_zone_id("Europe/Berlin")
        .unwrap();
    let engine = Engine::new().with_context(context);
    // Clocks go back from 03:00 CEST to 02:00 CET on this date.
    let value = engine
        .evaluate("dt_date_new(2024, 10, 27, 2, 30, 0)", &())
        .unwrap();
    let expected = Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap();
    assert_eq!(value, Value::DateTime(expected));
}

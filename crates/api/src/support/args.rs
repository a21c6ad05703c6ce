#![forbid(unsafe_code)]

use super::ai::ai_error;
use lf_core::ids::EntityIdError;
use lf_core::period::parse_date;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use time::Date;

const VALIDATION: &str = "VALIDATION_ERROR";

pub(crate) fn args_object(args: &Value) -> Result<&Map<String, Value>, Value> {
    args.as_object()
        .ok_or_else(|| ai_error(VALIDATION, "arguments must be an object"))
}

pub(crate) fn require_string(args: &Map<String, Value>, key: &str) -> Result<String, Value> {
    match args.get(key) {
        Some(Value::String(v)) => Ok(v.clone()),
        Some(Value::Null) | None => Err(ai_error(VALIDATION, &format!("{key} is required"))),
        Some(_) => Err(ai_error(VALIDATION, &format!("{key} must be a string"))),
    }
}

pub(crate) fn optional_string(
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, Value> {
    match args.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(Value::String(v)) => Ok(Some(v.clone())),
        Some(_) => Err(ai_error(VALIDATION, &format!("{key} must be a string"))),
    }
}

pub(crate) fn optional_u64(args: &Map<String, Value>, key: &str) -> Result<Option<u64>, Value> {
    match args.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            ai_error(
                VALIDATION,
                &format!("{key} must be a non-negative integer"),
            )
        }),
    }
}

pub(crate) fn require_u64(args: &Map<String, Value>, key: &str) -> Result<u64, Value> {
    optional_u64(args, key)?.ok_or_else(|| ai_error(VALIDATION, &format!("{key} is required")))
}

fn parse_id<T>(
    key: &str,
    value: &Value,
    make: impl FnOnce(i64) -> Result<T, EntityIdError>,
) -> Result<T, Value> {
    let Some(raw) = value.as_i64() else {
        return Err(ai_error(VALIDATION, &format!("{key} must be an integer")));
    };
    make(raw).map_err(|err| ai_error(VALIDATION, &err.message()))
}

pub(crate) fn require_id<T>(
    args: &Map<String, Value>,
    key: &str,
    make: impl FnOnce(i64) -> Result<T, EntityIdError>,
) -> Result<T, Value> {
    match args.get(key) {
        Some(Value::Null) | None => Err(ai_error(VALIDATION, &format!("{key} is required"))),
        Some(value) => parse_id(key, value, make),
    }
}

pub(crate) fn optional_id<T>(
    args: &Map<String, Value>,
    key: &str,
    make: impl FnOnce(i64) -> Result<T, EntityIdError>,
) -> Result<Option<T>, Value> {
    match args.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => parse_id(key, value, make).map(Some),
    }
}

/// Absent keeps the stored reference, `null` clears it.
pub(crate) fn patch_id<T>(
    args: &Map<String, Value>,
    key: &str,
    make: impl FnOnce(i64) -> Result<T, EntityIdError>,
) -> Result<Option<Option<T>>, Value> {
    match args.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(value) => parse_id(key, value, make).map(|id| Some(Some(id))),
    }
}

/// Duplicate ids collapse into one entry.
pub(crate) fn require_id_set<T: Ord>(
    args: &Map<String, Value>,
    key: &str,
    make: impl Fn(i64) -> Result<T, EntityIdError>,
) -> Result<BTreeSet<T>, Value> {
    let Some(value) = args.get(key) else {
        return Err(ai_error(VALIDATION, &format!("{key} is required")));
    };
    let Some(items) = value.as_array() else {
        return Err(ai_error(
            VALIDATION,
            &format!("{key} must be an array of integers"),
        ));
    };
    items
        .iter()
        .map(|item| parse_id(key, item, &make))
        .collect()
}

pub(crate) fn optional_date(
    args: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<Date>, Value> {
    match optional_string(args, key)? {
        None => Ok(None),
        Some(raw) => parse_date(key, &raw)
            .map(Some)
            .map_err(|err| ai_error(VALIDATION, &err.message())),
    }
}

pub(crate) fn require_date(args: &Map<String, Value>, key: &'static str) -> Result<Date, Value> {
    optional_date(args, key)?.ok_or_else(|| ai_error(VALIDATION, &format!("{key} is required")))
}

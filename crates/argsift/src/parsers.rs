//! Ready-made value parsers.
//!
//! Argument parsers take one raw value; positional parsers take the whole list
//! a slot collected. Both are also addressable by name for declarations loaded
//! from a file.

use serde_json::{Number, Value};

use crate::error::BoxError;

pub type ArgFn = fn(&str) -> Result<Value, BoxError>;
pub type PositionalFn = fn(&[String]) -> Result<Value, BoxError>;

/// Names accepted by [`arg_parser`].
pub const ARG_PARSERS: &[&str] = &["string", "int", "float", "bool"];

/// Names accepted by [`positional_parser`].
pub const POSITIONAL_PARSERS: &[&str] = &["join", "ints", "first"];

/// Look up an argument parser by name.
pub fn arg_parser(name: &str) -> Option<ArgFn> {
    let f: ArgFn = match name {
        "string" => string,
        "int" => int,
        "float" => float,
        "bool" => boolean,
        _ => return None,
    };
    Some(f)
}

/// Look up a positional parser by name.
pub fn positional_parser(name: &str) -> Option<PositionalFn> {
    let f: PositionalFn = match name {
        "join" => join,
        "ints" => ints,
        "first" => first,
        _ => return None,
    };
    Some(f)
}

pub fn string(raw: &str) -> Result<Value, BoxError> {
    Ok(Value::String(raw.to_string()))
}

pub fn int(raw: &str) -> Result<Value, BoxError> {
    let n: i64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("invalid integer '{raw}': {e}"))?;
    Ok(Value::from(n))
}

pub fn float(raw: &str) -> Result<Value, BoxError> {
    let f: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("invalid number '{raw}': {e}"))?;
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| format!("number is not finite: '{raw}'").into())
}

/// `true/yes/on/1` and `false/no/off/0`, case-insensitive.
pub fn boolean(raw: &str) -> Result<Value, BoxError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
        "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
        _ => Err(format!("invalid boolean '{raw}'").into()),
    }
}

/// Space-joined values as one string.
pub fn join(values: &[String]) -> Result<Value, BoxError> {
    Ok(Value::String(values.join(" ")))
}

pub fn ints(values: &[String]) -> Result<Value, BoxError> {
    values
        .iter()
        .map(|v| int(v))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// The first value, or `null` when the slot is empty.
pub fn first(values: &[String]) -> Result<Value, BoxError> {
    Ok(values.first().cloned().map(Value::String).unwrap_or(Value::Null))
}

//! Field decoders for the backend's loosely typed JSON.
//!
//! The backend serializes MySQL rows directly, so booleans arrive as `0`/`1`,
//! decimals may arrive as strings and ids may be numeric. Everything is
//! normalized here so the typed contracts above this layer never guess.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(value)) => Ok(value),
        Some(Value::Number(number)) => Ok(number.as_f64().map(|v| v != 0.0).unwrap_or(false)),
        Some(Value::String(raw)) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            other => Err(D::Error::custom(format!("invalid flag `{other}`"))),
        },
        Some(other) => Err(D::Error::custom(format!("invalid flag {other}"))),
    }
}

pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    opt_number(deserializer).map(|value| value.unwrap_or(0.0))
}

pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid number `{raw}`"))),
        Some(other) => Err(D::Error::custom(format!("invalid number {other}"))),
    }
}

pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    opt_number(deserializer).map(|value| value.map(|v| v.max(0.0) as u64).unwrap_or(0))
}

pub fn opt_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_number(deserializer).map(|value| value.map(|v| v.floor() as i64))
}

pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    opt_id(deserializer)?.ok_or_else(|| D::Error::custom("missing id"))
}

pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) if raw.is_empty() => Ok(None),
        Some(Value::String(raw)) => Ok(Some(raw)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(D::Error::custom(format!("invalid id {other}"))),
    }
}

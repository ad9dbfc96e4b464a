//! Cell coercion: declared column type + raw JSON scalar → typed [`Value`].
//!
//! Integral and decimal columns accept either a native number or a
//! numeric string and are parsed exactly from their text, never through
//! `f64`. `null` is always the typed null of the column; anything else
//! that does not fit the column is an error.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value as Json;
use tabstream_api::value::NANOS_PER_TICK;
use tabstream_api::{ColumnType, Value};
use uuid::Uuid;

use crate::wire::json_kind;

const TICKS_PER_SECOND: i64 = 1_000_000_000 / NANOS_PER_TICK;
const TICK_DIGITS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoerceError {
    #[error("{column_type} cell cannot hold a JSON {found}")]
    Mismatch { column_type: String, found: &'static str },

    #[error("invalid {column_type} literal '{text}': {reason}")]
    Parse { column_type: String, text: String, reason: String },
}

impl CoerceError {
    fn mismatch(ty: &ColumnType, raw: &Json) -> Self {
        CoerceError::Mismatch { column_type: ty.to_string(), found: json_kind(raw) }
    }

    fn parse(ty: &ColumnType, text: &str, reason: impl ToString) -> Self {
        CoerceError::Parse {
            column_type: ty.to_string(),
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Coerce one cell.
pub fn coerce(ty: &ColumnType, raw: &Json) -> Result<Value, CoerceError> {
    if raw.is_null() {
        return Ok(ty.null());
    }
    match ty {
        ColumnType::Int => integer_text(ty, raw)
            .and_then(|t| t.parse::<i32>().map_err(|e| CoerceError::parse(ty, &t, e)))
            .map(|v| Value::Int(Some(v))),
        ColumnType::Long => integer_text(ty, raw)
            .and_then(|t| t.parse::<i64>().map_err(|e| CoerceError::parse(ty, &t, e)))
            .map(|v| Value::Long(Some(v))),
        ColumnType::Real => real(ty, raw).map(|v| Value::Real(Some(v))),
        ColumnType::Decimal => decimal(ty, raw).map(|v| Value::Decimal(Some(v))),
        ColumnType::String => match raw {
            Json::String(s) => Ok(Value::String(Some(s.clone()))),
            other => Err(CoerceError::mismatch(ty, other)),
        },
        ColumnType::Bool => match raw {
            Json::Bool(b) => Ok(Value::Bool(Some(*b))),
            Json::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(Some(false))),
                Some(1) => Ok(Value::Bool(Some(true))),
                _ => Err(CoerceError::parse(ty, &n.to_string(), "only 0 and 1 are booleans")),
            },
            other => Err(CoerceError::mismatch(ty, other)),
        },
        ColumnType::DateTime => match raw {
            Json::String(s) => parse_datetime(s)
                .map(|v| Value::DateTime(Some(v)))
                .map_err(|reason| CoerceError::parse(ty, s, reason)),
            other => Err(CoerceError::mismatch(ty, other)),
        },
        ColumnType::Timespan => match raw {
            Json::String(s) => parse_timespan(s)
                .map(|v| Value::Timespan(Some(v)))
                .map_err(|reason| CoerceError::parse(ty, s, reason)),
            Json::Number(n) => {
                let text = n.to_string();
                text.parse::<i64>()
                    .ok()
                    .and_then(ticks_to_delta)
                    .map(|v| Value::Timespan(Some(v)))
                    .ok_or_else(|| CoerceError::parse(ty, &text, "not an integral tick count"))
            }
            other => Err(CoerceError::mismatch(ty, other)),
        },
        ColumnType::Guid => match raw {
            Json::String(s) => Uuid::parse_str(s)
                .map(|g| Value::Guid(Some(g)))
                .map_err(|e| CoerceError::parse(ty, s, e)),
            other => Err(CoerceError::mismatch(ty, other)),
        },
        ColumnType::Dynamic => Ok(Value::Dynamic(Some(dynamic(raw)))),
        ColumnType::Other(_) => match raw {
            Json::String(s) => Ok(Value::String(Some(s.clone()))),
            other => Ok(Value::String(Some(other.to_string()))),
        },
    }
}

/// Source text of an integral cell.
fn integer_text(ty: &ColumnType, raw: &Json) -> Result<String, CoerceError> {
    match raw {
        Json::Number(n) => Ok(n.to_string()),
        Json::String(s) => Ok(s.clone()),
        other => Err(CoerceError::mismatch(ty, other)),
    }
}

fn real(ty: &ColumnType, raw: &Json) -> Result<f64, CoerceError> {
    match raw {
        Json::Number(n) => n
            .as_f64()
            .ok_or_else(|| CoerceError::parse(ty, &n.to_string(), "out of range")),
        Json::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            text if is_decimal_literal(text) => {
                text.parse::<f64>().map_err(|e| CoerceError::parse(ty, text, e))
            }
            text => Err(CoerceError::parse(ty, text, "not a number")),
        },
        other => Err(CoerceError::mismatch(ty, other)),
    }
}

fn decimal(ty: &ColumnType, raw: &Json) -> Result<String, CoerceError> {
    let text = match raw {
        Json::Number(n) => n.to_string(),
        Json::String(s) => s.clone(),
        other => return Err(CoerceError::mismatch(ty, other)),
    };
    if is_decimal_literal(&text) {
        Ok(text)
    } else {
        Err(CoerceError::parse(ty, &text, "not a decimal number"))
    }
}

/// `[+-]digits[.digits][(e|E)[+-]digits]`, with at least one mantissa digit.
fn is_decimal_literal(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = !(int.is_empty() && frac.is_empty()) && digits(int) && digits(frac);
    let exponent_ok = match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['-', '+']).unwrap_or(e);
            !e.is_empty() && digits(e)
        }
    };
    mantissa_ok && exponent_ok
}

/// Dynamic cells are shipped as serialized JSON; a string holding a JSON
/// document becomes that document, any other string stays a string.
fn dynamic(raw: &Json) -> Json {
    match raw {
        Json::String(s) => serde_json::from_str(s).unwrap_or_else(|_| raw.clone()),
        other => other.clone(),
    }
}

/// RFC 3339 with up to 100ns precision, normalized to UTC.
pub fn parse_datetime(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

/// `[-][d.]hh:mm:ss[.fffffff]`.
pub fn parse_timespan(text: &str) -> Result<TimeDelta, String> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let mut parts = body.split(':');
    let (Some(head), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err("expected [-][d.]hh:mm:ss[.fffffff]".into());
    };

    let (days, hours) = match head.split_once('.') {
        Some((d, h)) => (unsigned(d, "days")?, unsigned(h, "hours")?),
        None => (0, unsigned(head, "hours")?),
    };
    let minutes = unsigned(minutes, "minutes")?;
    let (seconds, ticks) = match seconds.split_once('.') {
        Some((s, frac)) => (unsigned(s, "seconds")?, fraction_ticks(frac)?),
        None => (unsigned(seconds, "seconds")?, 0),
    };
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err("component out of range".into());
    }

    let total_secs = days
        .checked_mul(86_400)
        .and_then(|s| s.checked_add(hours * 3_600 + minutes * 60 + seconds))
        .ok_or("timespan out of range")?;
    let delta = TimeDelta::new(total_secs, (ticks * NANOS_PER_TICK) as u32)
        .ok_or("timespan out of range")?;
    Ok(if negative { -delta } else { delta })
}

fn unsigned(s: &str, what: &str) -> Result<i64, String> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid {what} component '{s}'"));
    }
    s.parse::<i64>().map_err(|e| format!("invalid {what} component '{s}': {e}"))
}

fn fraction_ticks(frac: &str) -> Result<i64, String> {
    if frac.is_empty() || frac.len() > TICK_DIGITS || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid fraction '{frac}'"));
    }
    let padded = format!("{frac:0<width$}", width = TICK_DIGITS);
    padded.parse::<i64>().map_err(|e| e.to_string())
}

fn ticks_to_delta(ticks: i64) -> Option<TimeDelta> {
    let secs = ticks.div_euclid(TICKS_PER_SECOND);
    let nanos = ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
    TimeDelta::new(secs, nanos as u32)
}

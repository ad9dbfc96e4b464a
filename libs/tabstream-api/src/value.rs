use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

/// Declared column type, as carried by `Columns[].ColumnType`.
///
/// The vocabulary is closed; anything else lands in `Other` and is handled
/// according to [`UnknownColumnTypePolicy`](crate::config::UnknownColumnTypePolicy).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int,
    Long,
    Real,
    String,
    Bool,
    DateTime,
    Timespan,
    Guid,
    Decimal,
    Dynamic,
    /// Type name not in the vocabulary, kept verbatim.
    Other(String),
}

impl ColumnType {
    /// Map a wire type name. Matching is exact: `"Int"` is not `int`.
    pub fn from_wire(name: &str) -> Self {
        match name {
            "int" => ColumnType::Int,
            "long" => ColumnType::Long,
            "real" => ColumnType::Real,
            "string" => ColumnType::String,
            "bool" => ColumnType::Bool,
            "datetime" => ColumnType::DateTime,
            "timespan" => ColumnType::Timespan,
            "guid" => ColumnType::Guid,
            "decimal" => ColumnType::Decimal,
            "dynamic" => ColumnType::Dynamic,
            other => ColumnType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Long => "long",
            ColumnType::Real => "real",
            ColumnType::String => "string",
            ColumnType::Bool => "bool",
            ColumnType::DateTime => "datetime",
            ColumnType::Timespan => "timespan",
            ColumnType::Guid => "guid",
            ColumnType::Decimal => "decimal",
            ColumnType::Dynamic => "dynamic",
            ColumnType::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ColumnType::Other(_))
    }

    /// The null value for this column type.
    pub fn null(&self) -> Value {
        match self {
            ColumnType::Int => Value::Int(None),
            ColumnType::Long => Value::Long(None),
            ColumnType::Real => Value::Real(None),
            ColumnType::String | ColumnType::Other(_) => Value::String(None),
            ColumnType::Bool => Value::Bool(None),
            ColumnType::DateTime => Value::DateTime(None),
            ColumnType::Timespan => Value::Timespan(None),
            ColumnType::Guid => Value::Guid(None),
            ColumnType::Decimal => Value::Decimal(None),
            ColumnType::Dynamic => Value::Dynamic(None),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed cell value.
///
/// Every variant is nullable: `None` is an explicit null from the wire
/// (Valid = false), independent of the zero value of the representation.
///
/// Strategy by type:
/// - Int, Long: exact integer parse, never through `f64`
/// - Decimal: validated literal kept as text, no binary float
/// - DateTime, Timespan: 100ns precision
/// - Dynamic: opaque JSON document, not interpreted further
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(Option<i32>),
    Long(Option<i64>),
    Real(Option<f64>),
    String(Option<String>),
    Bool(Option<bool>),
    DateTime(Option<DateTime<Utc>>),
    Timespan(Option<TimeDelta>),
    Guid(Option<Uuid>),
    Decimal(Option<String>),
    Dynamic(Option<serde_json::Value>),
}

impl Value {
    /// `false` for an explicit null.
    pub fn is_valid(&self) -> bool {
        match self {
            Value::Int(v) => v.is_some(),
            Value::Long(v) => v.is_some(),
            Value::Real(v) => v.is_some(),
            Value::String(v) => v.is_some(),
            Value::Bool(v) => v.is_some(),
            Value::DateTime(v) => v.is_some(),
            Value::Timespan(v) => v.is_some(),
            Value::Guid(v) => v.is_some(),
            Value::Decimal(v) => v.is_some(),
            Value::Dynamic(v) => v.is_some(),
        }
    }

    pub fn is_null(&self) -> bool {
        !self.is_valid()
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(Some(v)) => Some(i64::from(*v)),
            Value::Long(Some(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(Some(s)) | Value::Decimal(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// Render the value back into a generic JSON value.
    ///
    /// Datetimes use RFC 3339 with 7 fractional digits, timespans the
    /// `[-][d.]hh:mm:ss.fffffff` form, decimals their exact literal.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Int(Some(v)) => Json::from(*v),
            Value::Long(Some(v)) => Json::from(*v),
            Value::Real(Some(v)) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or_else(|| Json::String(v.to_string())),
            Value::String(Some(s)) | Value::Decimal(Some(s)) => Json::String(s.clone()),
            Value::Bool(Some(b)) => Json::Bool(*b),
            Value::DateTime(Some(dt)) => Json::String(format_datetime(dt)),
            Value::Timespan(Some(ts)) => Json::String(format_timespan(ts)),
            Value::Guid(Some(g)) => Json::String(g.to_string()),
            Value::Dynamic(Some(d)) => d.clone(),
            _ => Json::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(Some(v)) => write!(f, "{v}"),
            Value::Long(Some(v)) => write!(f, "{v}"),
            Value::Real(Some(v)) => write!(f, "{v}"),
            Value::String(Some(s)) | Value::Decimal(Some(s)) => f.write_str(s),
            Value::Bool(Some(b)) => write!(f, "{b}"),
            Value::DateTime(Some(dt)) => f.write_str(&format_datetime(dt)),
            Value::Timespan(Some(ts)) => f.write_str(&format_timespan(ts)),
            Value::Guid(Some(g)) => write!(f, "{g}"),
            Value::Dynamic(Some(d)) => write!(f, "{d}"),
            _ => Ok(()),
        }
    }
}

/// Number of nanoseconds in one timespan tick.
pub const NANOS_PER_TICK: i64 = 100;

fn format_datetime(dt: &DateTime<Utc>) -> String {
    let ticks = i64::from(dt.timestamp_subsec_nanos()) / NANOS_PER_TICK;
    format!("{}.{ticks:07}Z", dt.format("%Y-%m-%dT%H:%M:%S"))
}

fn format_timespan(ts: &TimeDelta) -> String {
    let negative = *ts < TimeDelta::zero();
    let abs = ts.abs();
    let total_secs = abs.num_seconds();
    let ticks = i64::from(abs.subsec_nanos()) / NANOS_PER_TICK;

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let sign = if negative { "-" } else { "" };
    let day_part = if days > 0 { format!("{days}.") } else { String::new() };
    if ticks > 0 {
        format!("{sign}{day_part}{hours:02}:{minutes:02}:{seconds:02}.{ticks:07}")
    } else {
        format!("{sign}{day_part}{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Positional array of values. Order matches the table's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

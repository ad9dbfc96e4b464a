//! Strict typed access to the fields of one frame object.
//!
//! A field that is present with the wrong JSON type (including `null`)
//! is `WrongType`, a field that is absent is `MissingField`. Optional
//! accessors only relax the second rule.

use serde_json::{Map, Value as Json};
use tabstream_api::{DecodeError, FrameKind, TableId};

pub(crate) const FRAME_TYPE: &str = "FrameType";
pub(crate) const TABLE_ID: &str = "TableId";

/// Name of the JSON type of `v`, for error messages.
pub(crate) fn json_kind(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

pub(crate) struct Fields<'a> {
    frame: FrameKind,
    map: &'a Map<String, Json>,
    /// Set by [`table_id`](Self::table_id); tags later field errors.
    table: Option<TableId>,
}

impl<'a> Fields<'a> {
    /// Wrap `element` as a frame of kind `frame`, checking that it is an
    /// object whose discriminator is exactly the frame's literal.
    pub(crate) fn open(frame: FrameKind, element: &'a Json) -> Result<Self, DecodeError> {
        let map = element.as_object().ok_or_else(|| {
            DecodeError::MalformedFrame(format!(
                "{frame} must be an object, got {}",
                json_kind(element)
            ))
        })?;
        let fields = Self { frame, map, table: None };
        let tag = fields.string(FRAME_TYPE)?;
        if tag != frame.as_str() {
            return Err(DecodeError::MalformedFrame(format!(
                "expected FrameType '{frame}', found '{tag}'"
            )));
        }
        Ok(fields)
    }

    pub(crate) fn frame(&self) -> FrameKind {
        self.frame
    }

    pub(crate) fn missing(&self, field: impl Into<String>) -> DecodeError {
        DecodeError::MissingField { frame: self.frame, table: self.table, field: field.into() }
    }

    pub(crate) fn wrong(&self, field: impl Into<String>, expected: &'static str) -> DecodeError {
        DecodeError::WrongType {
            frame: self.frame,
            table: self.table,
            field: field.into(),
            expected,
        }
    }

    fn get(&self, field: &str) -> Result<&'a Json, DecodeError> {
        self.map.get(field).ok_or_else(|| self.missing(field))
    }

    pub(crate) fn string(&self, field: &str) -> Result<&'a str, DecodeError> {
        self.get(field)?.as_str().ok_or_else(|| self.wrong(field, "a string"))
    }

    pub(crate) fn bool(&self, field: &str) -> Result<bool, DecodeError> {
        self.get(field)?.as_bool().ok_or_else(|| self.wrong(field, "a bool"))
    }

    pub(crate) fn opt_bool(&self, field: &str) -> Result<Option<bool>, DecodeError> {
        match self.map.get(field) {
            None => Ok(None),
            Some(v) => v.as_bool().map(Some).ok_or_else(|| self.wrong(field, "a bool")),
        }
    }

    pub(crate) fn array(&self, field: &str) -> Result<&'a [Json], DecodeError> {
        self.get(field)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.wrong(field, "an array"))
    }

    pub(crate) fn opt_array(&self, field: &str) -> Result<Option<&'a [Json]>, DecodeError> {
        match self.map.get(field) {
            None => Ok(None),
            Some(v) => v
                .as_array()
                .map(|a| Some(a.as_slice()))
                .ok_or_else(|| self.wrong(field, "an array")),
        }
    }

    pub(crate) fn number(&self, field: &str) -> Result<f64, DecodeError> {
        self.get(field)?.as_f64().ok_or_else(|| self.wrong(field, "a number"))
    }

    pub(crate) fn opt_count(&self, field: &str) -> Result<Option<u64>, DecodeError> {
        match self.map.get(field) {
            None => Ok(None),
            Some(v) => parse_integer::<u64>(v)
                .map(Some)
                .ok_or_else(|| self.wrong(field, "a non-negative integer")),
        }
    }

    /// `TableId`, accepted as a native integer or a base-10 integer string.
    /// Once read, it is attached to every later field error of this frame.
    pub(crate) fn table_id(&mut self) -> Result<TableId, DecodeError> {
        let id = parse_integer::<TableId>(self.get(TABLE_ID)?)
            .ok_or_else(|| self.wrong(TABLE_ID, "an integer or integer string"))?;
        self.table = Some(id);
        Ok(id)
    }
}

/// Exact integer read of a number or numeric string. Fractions and
/// exponents are rejected rather than rounded.
pub(crate) fn parse_integer<T: std::str::FromStr>(v: &Json) -> Option<T> {
    match v {
        Json::Number(n) => n.to_string().parse().ok(),
        Json::String(s) => s.parse().ok(),
        _ => None,
    }
}

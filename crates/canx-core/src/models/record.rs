//! Structured policy record built from rule matches.
//!
//! The record is a flat map keyed by dot-separated field paths. All writes go
//! through [`PolicyRecord::write`], which enforces first-match-wins and the
//! numeric coercion of count-like fields.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::rules::number::parse_count;

/// Final path segments whose values are counts and must be numeric.
pub const NUMERIC_SUFFIXES: &[&str] = &[
    "nights",
    "percent",
    "days",
    "hours",
    "cutoff_days",
    "cutoff_hours",
];

/// A scalar value stored at a leaf of the record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Verbatim text.
    Text(String),
    /// Decimal number.
    Number(Decimal),
}

impl FieldValue {
    /// Create a text value.
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Whether the value carries no data.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// Convert to a JSON scalar; integral numbers become JSON integers.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => number_to_json(*n),
        }
    }
}

fn number_to_json(n: Decimal) -> Value {
    if n.fract().is_zero() {
        if let Some(i) = n.to_i64() {
            return Value::from(i);
        }
    }
    n.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(n.to_string()))
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n.normalize()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Decimal> for FieldValue {
    fn from(n: Decimal) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(Decimal::from(n))
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Outcome of a single write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The value was stored.
    Written,
    /// The leaf already holds a value; first match wins.
    Occupied,
    /// The path collides with an existing leaf or subtree.
    Conflict,
    /// The value was empty and nothing was stored.
    Empty,
    /// The path is empty or has empty segments.
    InvalidPath,
}

/// Nested cancellation-policy record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyRecord {
    fields: BTreeMap<String, FieldValue>,
    malformed: BTreeSet<String>,
}

impl PolicyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a value at `path` unless the leaf is already set.
    ///
    /// Count-like paths (see [`NUMERIC_SUFFIXES`]) have string values
    /// re-parsed as numbers; unparseable strings are kept and the path is
    /// flagged as malformed.
    pub fn write(&mut self, path: &str, value: FieldValue) -> WriteOutcome {
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return WriteOutcome::InvalidPath;
        }
        if value.is_empty() {
            return WriteOutcome::Empty;
        }
        if self.fields.contains_key(path) {
            return WriteOutcome::Occupied;
        }
        if self.collides(path) {
            return WriteOutcome::Conflict;
        }

        let value = match value {
            FieldValue::Text(s) if is_numeric_path(path) => match parse_count(&s) {
                Some(n) => FieldValue::Number(n),
                None => {
                    self.malformed.insert(path.to_string());
                    FieldValue::Text(s)
                }
            },
            other => other,
        };

        self.fields.insert(path.to_string(), value);
        WriteOutcome::Written
    }

    fn collides(&self, path: &str) -> bool {
        self.fields.keys().any(|existing| {
            is_ancestor(existing, path) || is_ancestor(path, existing)
        })
    }

    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.fields.get(path)
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(FieldValue::as_text)
    }

    pub fn number(&self, path: &str) -> Option<Decimal> {
        self.get(path).and_then(FieldValue::as_number)
    }

    /// Whether `path` holds a non-empty value.
    pub fn is_present(&self, path: &str) -> bool {
        self.get(path).is_some_and(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over leaves in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Count-like paths that hold a non-numeric string.
    pub fn malformed_numeric(&self) -> impl Iterator<Item = &str> {
        self.malformed.iter().map(String::as_str)
    }

    pub fn has_malformed_numeric(&self) -> bool {
        !self.malformed.is_empty()
    }

    /// Render the record as a nested JSON object.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for (path, value) in &self.fields {
            let mut segments = path.split('.').peekable();
            let mut node = &mut root;
            while let Some(segment) = segments.next() {
                if segments.peek().is_none() {
                    node.insert(segment.to_string(), value.to_json());
                    break;
                }
                let child = node
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                match child {
                    Value::Object(map) => node = map,
                    _ => break,
                }
            }
        }
        Value::Object(root)
    }
}

impl Serialize for PolicyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn is_numeric_path(path: &str) -> bool {
    let last = path.rsplit('.').next().unwrap_or(path);
    NUMERIC_SUFFIXES.contains(&last)
}

fn is_ancestor(ancestor: &str, path: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

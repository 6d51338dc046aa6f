//! Core types for the Minutario engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single run of styled text for the template renderer.
///
/// Sequence-ordered; concatenating the `text` fields reconstructs the
/// visual paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl StyledRun {
    /// Create an unformatted run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
            underline: false,
        }
    }

    /// Create a run with explicit emphasis flags.
    pub fn styled(text: impl Into<String>, bold: bool, italic: bool, underline: bool) -> Self {
        Self {
            text: text.into(),
            bold,
            italic,
            underline,
        }
    }
}

/// Represents any leaf value in a rendering context.
///
/// The template renderer accepts plain scalars, styled-run sequences,
/// and nested lists/records of the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null/absent value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Styled-run sequence (normalized rich text)
    Runs(Vec<StyledRun>),
    /// Array of values
    Array(Vec<Value>),
    /// Object/Map of values
    Object(HashMap<String, Value>),
}

impl Value {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get value as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get value as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get value as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get value as array reference
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Try to get value as object reference
    pub fn as_object(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Try to get value as a styled-run sequence
    pub fn as_runs(&self) -> Option<&Vec<StyledRun>> {
        match self {
            Value::Runs(r) => Some(r),
            _ => None,
        }
    }

    /// Convert a `serde_json::Value` into an engine value.
    ///
    /// Numbers become `Int` when they fit an i64, `Float` otherwise.
    pub fn from_json(v: serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(obj) => Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert an engine value into a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::json!(*i),
            Value::Float(f) => serde_json::json!(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Runs(runs) => serde_json::json!(runs),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => {
                let obj: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                serde_json::Value::Object(obj)
            }
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<StyledRun>> for Value {
    fn from(runs: Vec<StyledRun>) -> Self {
        Value::Runs(runs)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// A wire value that may arrive as a number or as a string.
///
/// Form payloads are inconsistent about this (amounts typed into text
/// inputs arrive as strings, computed totals as numbers), so fields
/// that feed the transcriber accept either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    /// The numeric literal as entered, for the parallel digits form.
    pub fn as_text(&self) -> String {
        match self {
            Numeric::Int(i) => i.to_string(),
            Numeric::Float(f) => f.to_string(),
            Numeric::Text(s) => s.trim().to_string(),
        }
    }

    /// True when no usable value was entered.
    pub fn is_empty(&self) -> bool {
        matches!(self, Numeric::Text(s) if s.trim().is_empty())
    }
}

impl Default for Numeric {
    fn default() -> Self {
        Numeric::Text(String::new())
    }
}

impl std::fmt::Display for Numeric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Authenticated staff identity supplied by the calling layer.
///
/// The engine never authenticates anyone; it receives the acting user
/// from the identity provider and records who generated each document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub role: String,
}

/// Fully derived mapping from template variable name to value.
///
/// Stateless; built per request and discarded after one render.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderingContext {
    entries: HashMap<String, Value>,
}

impl RenderingContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under a template variable name.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Insert any serializable record, converted through JSON.
    ///
    /// Used for the typed per-branch records so the template sees the
    /// same nested shape the serde derives declare.
    pub fn set_record<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        record: &T,
    ) -> crate::error::Result<()> {
        let json = serde_json::to_value(record)?;
        self.entries.insert(key.into(), Value::from_json(json));
        Ok(())
    }

    /// Look up a value by template variable name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Number of template variables.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no variables have been set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

//! Runtime values checked for conformance
//!
//! Every value carries its basic kind explicitly, so conformance is an
//! exhaustive match instead of capability probing.

use crate::config::Options;
use crate::ty::NumericKind;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A number together with its place in the numeric tower
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Number {
    /// Whole number
    Integer(i64),
    /// Ratio of two integers
    Rational {
        /// Numerator
        numer: i64,
        /// Denominator
        denom: i64,
    },
    /// Floating point real
    Real(f64),
    /// Complex number
    Complex {
        /// Real part
        re: f64,
        /// Imaginary part
        im: f64,
    },
}

impl Number {
    /// Numeric kind of this number
    pub fn kind(&self) -> NumericKind {
        match self {
            Number::Integer(_) => NumericKind::Integer,
            Number::Rational { .. } => NumericKind::Rational,
            Number::Real(_) => NumericKind::Real,
            Number::Complex { .. } => NumericKind::Complex,
        }
    }
}

/// A tagged record value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Nominal tag of the record
    pub tag: String,
    /// Field values
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record with no fields
    pub fn new(tag: impl Into<String>) -> Self {
        Record {
            tag: tag.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field, builder style
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A runtime value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// `null`
    Null,
    /// `true` or `false`
    Boolean(bool),
    /// Any member of the numeric tower
    Number(Number),
    /// Text
    String(String),
    /// Point in time
    DateTime(DateTime<FixedOffset>),
    /// Ordered list of values
    Sequence(Vec<Value>),
    /// Tagged record
    Record(Record),
}

impl Value {
    /// Short name of the value's basic kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Sequence(_) => "sequence",
            Value::Record(_) => "record",
        }
    }

    /// Convert a JSON document into a runtime value
    ///
    /// Objects become records tagged by their `options.json_tag_key` entry
    /// (the root tag when absent); the tag entry itself is not a field.
    /// Integral numbers become integers, all other numbers reals.
    pub fn from_json(json: &serde_json::Value, options: &Options) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(Number::Integer(i)),
                None => Value::Number(Number::Real(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Sequence(
                items.iter().map(|item| Value::from_json(item, options)).collect(),
            ),
            serde_json::Value::Object(map) => {
                let tag = map
                    .get(&options.json_tag_key)
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or(options.root_tag.as_str())
                    .to_string();
                let fields = map
                    .iter()
                    .filter(|(key, _)| **key != options.json_tag_key)
                    .map(|(key, value)| (key.clone(), Value::from_json(value, options)))
                    .collect();
                Value::Record(Record { tag, fields })
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(Number::Integer(i)) => write!(f, "{}", i),
            Value::Number(Number::Rational { numer, denom }) => write!(f, "{}/{}", numer, denom),
            Value::Number(Number::Real(r)) => write!(f, "{}", r),
            Value::Number(Number::Complex { re, im }) => write!(f, "{}+{}i", re, im),
            Value::String(s) => write!(f, "{:?}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(record) => {
                write!(f, "{} {{ ", record.tag)?;
                for (i, (name, value)) in record.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Number::Integer(i))
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Number(Number::Real(r))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

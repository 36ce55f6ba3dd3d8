//! Document model adapter.
//!
//! Every component of this crate manipulates JSON through the [`Json`]
//! trait rather than a concrete representation. The trait covers
//! classification, construction, ordered access, mutation, extraction and
//! serialization; [`serde_json::Value`] is the backend shipped with the
//! crate, with object insertion order preserved and numeric literals kept
//! at full precision.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::{Number, Value};
use thiserror::Error;

/// The six JSON value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// a numeric literal
    Number,
    /// a string
    String,
    /// an ordered sequence of nodes
    Array,
    /// an ordered mapping from string keys to nodes
    Object,
}

/// Error returned when text fails to parse as a JSON document.
#[derive(Debug, Error)]
#[error("malformed JSON document: {0}")]
pub struct ParseError(#[from] serde_json::Error);

/// Polymorphic interface over an in-memory JSON representation.
///
/// Object iteration order equals insertion order, and replacing an
/// existing key keeps its position. Numbers carry their source precision;
/// they are narrowed to native numerics only through [`Json::reduced`].
pub trait Json: Clone + PartialEq + fmt::Debug + Sized {
    /// The kind tag of this node.
    fn kind(&self) -> Kind;

    /// `true` for `null`.
    fn is_null(&self) -> bool {
        self.kind() == Kind::Null
    }
    /// `true` for booleans.
    fn is_bool(&self) -> bool {
        self.kind() == Kind::Bool
    }
    /// `true` for numbers.
    fn is_number(&self) -> bool {
        self.kind() == Kind::Number
    }
    /// `true` for strings.
    fn is_string(&self) -> bool {
        self.kind() == Kind::String
    }
    /// `true` for arrays.
    fn is_array(&self) -> bool {
        self.kind() == Kind::Array
    }
    /// `true` for objects.
    fn is_object(&self) -> bool {
        self.kind() == Kind::Object
    }

    /// The null node.
    fn null() -> Self;
    /// Wrap a boolean.
    fn from_bool(value: bool) -> Self;
    /// Wrap a string.
    fn from_string(value: impl Into<String>) -> Self;
    /// Wrap a signed integer.
    fn from_i64(value: i64) -> Self;
    /// Wrap a float. Non-finite values become null, which is the only
    /// thing the wire format can carry for them.
    fn from_f64(value: f64) -> Self;
    /// Wrap an arbitrary-precision decimal without rounding.
    fn from_decimal(value: &BigDecimal) -> Self;
    /// Admit a wire-format value into this representation.
    fn from_json(value: Value) -> Self;
    /// Parse a JSON document from text.
    fn parse(text: &str) -> Result<Self, ParseError>;
    /// A fresh empty object.
    fn new_object() -> Self;
    /// A fresh empty array.
    fn new_array() -> Self;

    /// Number of entries of an object or elements of an array; `0` for
    /// every other kind.
    fn len(&self) -> usize;
    /// Emptiness: containers and strings by length, null is empty,
    /// numbers and booleans are not.
    fn is_empty(&self) -> bool;
    /// Member lookup on an object.
    fn get(&self, key: &str) -> Option<&Self>;
    /// Mutable member lookup on an object.
    fn get_mut(&mut self, key: &str) -> Option<&mut Self>;
    /// `true` when an object carries `key`.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
    /// Ordered object entries.
    fn entries(&self) -> impl Iterator<Item = (&str, &Self)>;
    /// Ordered array elements.
    fn elements(&self) -> impl Iterator<Item = &Self>;
    /// Array element by position.
    fn at(&self, index: usize) -> Option<&Self>;
    /// Mutable array element by position.
    fn at_mut(&mut self, index: usize) -> Option<&mut Self>;

    /// Insert-or-replace a member, keeping the position of a replaced
    /// binding. Returns the displaced node. No effect on non-objects.
    fn set(&mut self, key: &str, node: Self) -> Option<Self>;
    /// Append to an array. No effect on non-arrays.
    fn push(&mut self, node: Self);
    /// Insert before `index` in an array; `index` must be at most the
    /// current length. No effect on non-arrays.
    fn insert_at(&mut self, index: usize, node: Self);
    /// Detach a member, preserving the order of the remaining entries.
    fn remove_key(&mut self, key: &str) -> Option<Self>;
    /// Detach an array element by position.
    fn remove_at(&mut self, index: usize) -> Option<Self>;

    /// Borrow the string payload.
    fn as_str(&self) -> Option<&str>;
    /// Narrow a number to `f64`.
    fn as_f64(&self) -> Option<f64>;
    /// Read a number at full precision.
    fn as_big_decimal(&self) -> Option<BigDecimal>;
    /// Read a boolean.
    fn as_bool(&self) -> Option<bool>;
    /// Render this node as text. Whole-valued numbers render without a
    /// fractional part or exponent (`2.0` becomes `"2"`), fractional
    /// numbers drop trailing zeros but keep at least one digit, booleans
    /// render `"true"`/`"false"`, containers render as canonical JSON.
    fn to_display_string(&self) -> String;
    /// Canonical JSON text of this node.
    fn to_json_string(&self) -> String;

    /// Narrow every number in this tree to native `i64`/`f64` precision
    /// when the flag is set. This conversion is lossy and meant for
    /// user-facing boundaries only.
    fn reduced(self, reduce_big_decimals: bool) -> Self;
}

impl Json for Value {
    fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    fn null() -> Self {
        Value::Null
    }

    fn from_bool(value: bool) -> Self {
        Value::Bool(value)
    }

    fn from_string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    fn from_i64(value: i64) -> Self {
        Value::from(value)
    }

    fn from_f64(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }

    fn from_decimal(value: &BigDecimal) -> Self {
        Value::Number(Number::from_string_unchecked(value.to_plain_string()))
    }

    fn from_json(value: Value) -> Self {
        value
    }

    fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(text)?)
    }

    fn new_object() -> Self {
        Value::Object(serde_json::Map::new())
    }

    fn new_array() -> Self {
        Value::Array(Vec::new())
    }

    fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(_) | Value::Number(_) => false,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
        }
    }

    fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Self> {
        match self {
            Value::Object(map) => map.get_mut(key),
            _ => None,
        }
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &Self)> {
        self.as_object()
            .into_iter()
            .flatten()
            .map(|(key, node)| (key.as_str(), node))
    }

    fn elements(&self) -> impl Iterator<Item = &Self> {
        self.as_array().into_iter().flatten()
    }

    fn at(&self, index: usize) -> Option<&Self> {
        match self {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }

    fn at_mut(&mut self, index: usize) -> Option<&mut Self> {
        match self {
            Value::Array(items) => items.get_mut(index),
            _ => None,
        }
    }

    fn set(&mut self, key: &str, node: Self) -> Option<Self> {
        match self {
            Value::Object(map) => map.insert(key.to_owned(), node),
            _ => None,
        }
    }

    fn push(&mut self, node: Self) {
        if let Value::Array(items) = self {
            items.push(node);
        }
    }

    fn insert_at(&mut self, index: usize, node: Self) {
        if let Value::Array(items) = self {
            if index <= items.len() {
                items.insert(index, node);
            }
        }
    }

    fn remove_key(&mut self, key: &str) -> Option<Self> {
        match self {
            // shift_remove: the swap variant would break insertion order
            Value::Object(map) => map.shift_remove(key),
            _ => None,
        }
    }

    fn remove_at(&mut self, index: usize) -> Option<Self> {
        match self {
            Value::Array(items) if index < items.len() => Some(items.remove(index)),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    fn as_big_decimal(&self) -> Option<BigDecimal> {
        match self {
            Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn to_display_string(&self) -> String {
        match self {
            Value::Null => "null".to_owned(),
            Value::Bool(true) => "true".to_owned(),
            Value::Bool(false) => "false".to_owned(),
            Value::Number(n) => match self.as_big_decimal() {
                Some(decimal) => decimal.normalized().to_plain_string(),
                None => n.to_string(),
            },
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => self.to_json_string(),
        }
    }

    fn to_json_string(&self) -> String {
        serde_json::to_string(self).expect("Serializing a JSON Value to JSON should not fail")
    }

    fn reduced(self, reduce_big_decimals: bool) -> Self {
        if !reduce_big_decimals {
            return self;
        }
        match self {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::from(i)
                } else if let Some(u) = n.as_u64() {
                    Value::from(u)
                } else if let Some(f) = n.as_f64() {
                    Value::from_f64(f)
                } else {
                    Value::Number(n)
                }
            }
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|node| node.reduced(true)).collect())
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, node)| (key, node.reduced(true)))
                    .collect(),
            ),
            scalar => scalar,
        }
    }
}

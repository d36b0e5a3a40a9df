//! Decoded column values
//!
//! The on-disk format tags nothing: a value with an embedded `|` is a list.
//! `Value` makes that split explicit once bytes are decoded.

use std::fmt;

/// A decoded column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain value (also what a one-item list decodes to)
    Scalar(String),

    /// Two or more `|`-separated items
    List(Vec<String>),
}

impl Value {
    /// Create a scalar value
    pub fn scalar(value: impl Into<String>) -> Self {
        Value::Scalar(value.into())
    }

    /// Create a list value
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Interpret raw field content: any `|` makes it a list
    pub fn from_raw(raw: &str) -> Self {
        if raw.contains('|') {
            Value::List(raw.split('|').map(str::to_string).collect())
        } else {
            Value::Scalar(raw.to_string())
        }
    }

    /// The items of this value; a scalar is a single item
    pub fn items(&self) -> Vec<&str> {
        match self {
            Value::Scalar(s) => vec![s.as_str()],
            Value::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// The serialized form written into the value field (before padding)
    pub fn joined(&self) -> String {
        match self {
            Value::Scalar(s) => s.clone(),
            Value::List(items) => items.join("|"),
        }
    }

    /// Borrow the scalar content, if this is a scalar
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::List(_) => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// True for a scalar with no content
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Scalar(s) if s.is_empty())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Scalar(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::list(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

//! Evaluable value tree.
//!
//! [`Value`] is the structured input handed to a [`RuleEvaluator`](crate::RuleEvaluator).
//! It is immutable and `Arc`-backed: cloning a cached translation only bumps
//! reference counts. Object keys are ordered, so equal trees hash equally.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable, hashable value tree consumed by rule evaluators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    String(Arc<str>),
    Array(Arc<[Value]>),
    Object(Arc<BTreeMap<String, Value>>),
}

impl Value {
    #[must_use]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(s.into())
    }

    #[must_use]
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::Array(items.into_iter().collect())
    }

    #[must_use]
    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Object(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Array of string tokens.
    #[must_use]
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::array(items.into_iter().map(|s| Self::string(s.as_ref())))
    }

    /// Look up a key of an object value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns a copy of this object with `key` set to `value`.
    ///
    /// Non-object values are returned unchanged. The receiver is never
    /// modified; shared subtrees stay shared.
    #[must_use]
    pub fn with_entry(&self, key: impl Into<String>, value: Value) -> Value {
        match self {
            Self::Object(map) => {
                let mut map = BTreeMap::clone(map);
                map.insert(key.into(), value);
                Self::Object(Arc::new(map))
            }
            other => other.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(items) => items.iter().map(serde_json::Value::from).collect(),
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

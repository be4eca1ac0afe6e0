//! Query predicates over stored documents.
//!
//! Paths are dotted (`persistenceDetails.sequenceNumber`) and walk nested objects only.

use super::document::Document;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    All,
    /// Matches the store-assigned primary key.
    Key(String),
    KeyIn(Vec<String>),
    Eq(String, Value),
    In(String, Vec<Value>),
    /// The array at `path` holds `value`.
    Contains(String, Value),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    pub fn key_in<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::KeyIn(keys.into_iter().map(Into::into).collect())
    }

    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(path.into(), value.into())
    }

    pub fn contains(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains(path.into(), value.into())
    }

    /// Conjunction that keeps nested `And`s flat.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::All, other) => other,
            (this, Self::All) => this,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (this, other) => Self::And(vec![this, other]),
        }
    }

    pub fn matches(&self, key: &str, document: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Key(expected) => expected == key,
            Self::KeyIn(keys) => keys.iter().any(|candidate| candidate == key),
            Self::Eq(path, value) => lookup_path(document, path) == Some(value),
            Self::In(path, values) => lookup_path(document, path)
                .map(|found| values.contains(found))
                .unwrap_or(false),
            Self::Contains(path, value) => lookup_path(document, path)
                .and_then(Value::as_array)
                .map(|items| items.contains(value))
                .unwrap_or(false),
            Self::And(parts) => parts.iter().all(|part| part.matches(key, document)),
            Self::Or(parts) => parts.iter().any(|part| part.matches(key, document)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |parts: &[Predicate], sep: &str| {
            parts
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(sep)
        };
        match self {
            Self::All => write!(f, "*"),
            Self::Key(key) => write!(f, "key = {key}"),
            Self::KeyIn(keys) => write!(f, "key in [{}]", keys.join(", ")),
            Self::Eq(path, value) => write!(f, "{path} = {value}"),
            Self::In(path, values) => {
                let values: Vec<_> = values.iter().map(ToString::to_string).collect();
                write!(f, "{path} in [{}]", values.join(", "))
            }
            Self::Contains(path, value) => write!(f, "{path} contains {value}"),
            Self::And(parts) => write!(f, "({})", join(parts, " and ")),
            Self::Or(parts) => write!(f, "({})", join(parts, " or ")),
        }
    }
}

pub fn lookup_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

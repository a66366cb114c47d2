//! Per-invocation parameters handed to every probe

use std::collections::HashMap;

/// Name of the parameter requesting a quick, shallow check
pub const PARAMETER_QUICK: &str = "quick";

/// A parameter value: one string, or several when the key was repeated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    List(Vec<String>),
}

impl ParamValue {
    /// The value itself, or the first element of a list
    pub fn first(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::List(values) => values.first().map(String::as_str),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Read-only key/value mapping shared by all probes of one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    values: HashMap<String, ParamValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw URL query string (without the leading `?`)
    ///
    /// Keys that appear more than once are collected into a list in the order
    /// they were given.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.append(key.into_owned(), value.into_owned());
        }
        params
    }

    /// Set `key`, replacing any previous value
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    fn append(&mut self, key: String, value: String) {
        match self.values.remove(&key) {
            None => {
                self.values.insert(key, ParamValue::Single(value));
            }
            Some(ParamValue::Single(previous)) => {
                self.values.insert(key, ParamValue::List(vec![previous, value]));
            }
            Some(ParamValue::List(mut values)) => {
                values.push(value);
                self.values.insert(key, ParamValue::List(values));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether a quick check was requested
    ///
    /// Only the first element of a list is consulted. The value must read
    /// `true` ignoring ASCII case; anything else, including a missing key or
    /// an empty list, means a full check.
    pub fn is_quick(&self) -> bool {
        self.get(PARAMETER_QUICK)
            .and_then(ParamValue::first)
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

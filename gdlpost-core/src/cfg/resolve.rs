// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt;

use serde_yaml::{Mapping, Value};

use crate::error::PostError;

/// The kind of value expected at a configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    /// Either an integer or a float
    Number,
    String,
    Sequence,
    Mapping,
}

impl ValueKind {
    /// Check whether a value is of this kind
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::Bool => value.is_bool(),
            ValueKind::Int => value.is_i64() || value.is_u64(),
            ValueKind::Float => value.is_f64(),
            ValueKind::Number => value.is_number(),
            ValueKind::String => value.is_string(),
            ValueKind::Sequence => value.is_sequence(),
            ValueKind::Mapping => value.is_mapping(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        };
        write!(f, "{}", name)
    }
}

/// Name the kind of a yaml value for diagnostics
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

/// A single key or an ordered list of alternate keys
#[derive(Debug, Clone, Copy)]
pub enum Key<'a> {
    Single(&'a str),
    Candidates(&'a [&'a str]),
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(key: &'a str) -> Self {
        Key::Single(key)
    }
}

impl<'a> From<&'a [&'a str]> for Key<'a> {
    fn from(keys: &'a [&'a str]) -> Self {
        Key::Candidates(keys)
    }
}

impl<'a, const N: usize> From<&'a [&'a str; N]> for Key<'a> {
    fn from(keys: &'a [&'a str; N]) -> Self {
        Key::Candidates(keys.as_slice())
    }
}

/// A configuration lookup with a default, an optional type assertion and
/// an optional consume-once side effect
///
/// # Examples
///
/// ```
/// use serde_yaml::{Mapping, Value};
/// use gdlpost_core::cfg::{Lookup, ValueKind};
///
/// let mut config: Mapping = serde_yaml::from_str("simptol: 0.5\nto_cog: 'None'").unwrap();
///
/// let simptol = Lookup::new("simptol")
///     .expect(ValueKind::Number)
///     .resolve(Some(&mut config))
///     .unwrap();
/// assert_eq!(simptol, Value::from(0.5));
///
/// let to_cog = Lookup::new("to_cog")
///     .default(true)
///     .resolve(Some(&mut config))
///     .unwrap();
/// assert_eq!(to_cog, Value::Bool(true));
/// ```
#[derive(Debug, Clone)]
pub struct Lookup<'a> {
    key: Key<'a>,
    default: Value,
    expected: Option<ValueKind>,
    consume: bool,
    message: Option<&'a str>,
}

impl<'a> Lookup<'a> {
    pub fn new<K: Into<Key<'a>>>(key: K) -> Self {
        Lookup {
            key: key.into(),
            default: Value::Null,
            expected: None,
            consume: false,
            message: None,
        }
    }

    /// Value returned when the key cannot be found
    pub fn default<V: Into<Value>>(mut self, default: V) -> Self {
        self.default = default.into();
        self
    }

    /// Assert the found value is of the given kind
    pub fn expect(mut self, kind: ValueKind) -> Self {
        self.expected = Some(kind);
        self
    }

    /// Remove the key from the configuration once read
    pub fn consume(mut self) -> Self {
        self.consume = true;
        self
    }

    /// Message reported when a candidate list is malformed
    pub fn message(mut self, message: &'a str) -> Self {
        self.message = Some(message);
        self
    }

    /// Resolve the lookup against a configuration mapping
    pub fn resolve(self, config: Option<&mut Mapping>) -> Result<Value, PostError> {
        let config = match config {
            Some(config) if !config.is_empty() => config,
            _ => return Ok(self.default),
        };

        match self.key {
            Key::Single(key) => {
                let value = match config.get(key) {
                    None | Some(Value::Null) => return Ok(self.default),
                    Some(value) => value.clone(),
                };

                if is_none_literal(&value) {
                    if self.consume {
                        config.remove(key);
                    }
                    return Ok(self.default);
                }

                self.check(key, &value)?;

                if self.consume {
                    config.remove(key);
                }

                Ok(value)
            }
            Key::Candidates(keys) => {
                if keys.len() <= 1 {
                    let message = self
                        .message
                        .unwrap_or("Must provide at least two valid keys to test");
                    return Err(PostError::CandidateKeysError(message.to_string()));
                }

                // The last candidate present wins when several are found
                let mut found: Option<(&str, Value)> = None;
                for &key in keys {
                    if let Some(value) = config.get(key) {
                        found = Some((key, value.clone()));
                    }
                }

                let Some((key, value)) = found else {
                    return Ok(self.default);
                };

                self.check(key, &value)?;

                if self.consume {
                    for &key in keys {
                        config.remove(key);
                    }
                }

                Ok(value)
            }
        }
    }

    fn check(&self, key: &str, value: &Value) -> Result<(), PostError> {
        let Some(expected) = self.expected else {
            return Ok(());
        };

        if matches!(value, Value::Bool(false)) || expected.matches(value) {
            return Ok(());
        }

        Err(PostError::ConfigTypeError(format!(
            "Value {:?} at key {} is of type {}, expected {}",
            value,
            key,
            kind_name(value),
            expected
        )))
    }
}

/// Resolve a key with a default and no further checks
pub fn resolve<'a, K, V>(key: K, config: Option<&mut Mapping>, default: V) -> Result<Value, PostError>
where
    K: Into<Key<'a>>,
    V: Into<Value>,
{
    Lookup::new(key).default(default).resolve(config)
}

fn is_none_literal(value: &Value) -> bool {
    matches!(value, Value::String(s) if s == "None")
}

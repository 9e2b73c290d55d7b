// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use candle_core::pickle::Object;
use serde_yaml::{Mapping, Value};

/// Convert a decoded pickle object into a configuration value
///
/// Plain containers and scalars map directly. Objects rebuilt from a
/// state dictionary (e.g. omegaconf containers) are unwrapped through
/// their `_content` or `_val` entry. Anything else, such as tensors,
/// becomes null.
pub fn to_value(object: &Object) -> Value {
    match object {
        Object::Int(i) => Value::from(*i as i64),
        Object::Float(f) => Value::from(*f),
        Object::Bool(b) => Value::Bool(*b),
        Object::Unicode(s) => Value::String(s.clone()),
        Object::None => Value::Null,
        Object::List(items) | Object::Tuple(items) => {
            Value::Sequence(items.iter().map(to_value).collect())
        }
        Object::Dict(pairs) => Value::Mapping(to_mapping(pairs)),
        Object::Build { callable, args } => match (callable.as_ref(), args.as_ref()) {
            (Object::Dict(pairs), _) => Value::Mapping(to_mapping(pairs)),
            (_, Object::Dict(state)) => unwrap_state(state),
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

fn to_mapping(pairs: &[(Object, Object)]) -> Mapping {
    pairs
        .iter()
        .map(|(key, value)| (to_value(key), to_value(value)))
        .collect()
}

fn unwrap_state(state: &[(Object, Object)]) -> Value {
    for field in ["_content", "_val"] {
        if let Some((_, value)) = state
            .iter()
            .find(|(key, _)| matches!(key, Object::Unicode(k) if k == field))
        {
            return to_value(value);
        }
    }

    Value::Null
}

/// Look up a string key of a decoded pickle dictionary
pub fn dict_get<'a>(object: &'a Object, key: &str) -> Option<&'a Object> {
    let pairs = match object {
        Object::Dict(pairs) => pairs,
        Object::Build { callable, .. } => match callable.as_ref() {
            Object::Dict(pairs) => pairs,
            _ => return None,
        },
        _ => return None,
    };

    pairs
        .iter()
        .find(|(k, _)| matches!(k, Object::Unicode(name) if name == key))
        .map(|(_, value)| value)
}

// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_yaml::Value;

use crate::error::PostError;

/// Read a yaml parameters file into a configuration tree
///
/// # Arguments
///
/// * `path` - Path to a .yaml file
pub fn read_parameters<P: AsRef<Path>>(path: P) -> Result<Value, PostError> {
    let path = path.as_ref();

    let file = File::open(path)
        .map_err(|err| PostError::ConfigReadError(format!("{}: {}", path.display(), err)))?;

    let value: Value = serde_yaml::from_reader(BufReader::new(file))
        .map_err(|err| PostError::ConfigParseError(format!("{}: {}", path.display(), err)))?;

    match value {
        Value::Null => Err(PostError::ConfigParseError(format!(
            "{} is empty",
            path.display()
        ))),
        value => Ok(value),
    }
}

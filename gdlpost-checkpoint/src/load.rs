// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use candle_core::pickle::{Object, Stack};
use serde_yaml::Value;

use gdlpost_core::constant::{CHECKPOINT_MODEL_KEY, CHECKPOINT_PARAMS_KEY};
use gdlpost_core::error::PostError;

use crate::convert::{dict_get, to_value};

/// A model checkpoint with the training configuration it embeds
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub path: PathBuf,
    pub params: Option<Value>,
    pub has_model: bool,
}

impl Checkpoint {
    /// Read a zip-based checkpoint archive
    ///
    /// Only the pickled top-level dictionary is decoded, tensor storage is
    /// never loaded.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a checkpoint written with `torch.save`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PostError> {
        let path = path.as_ref();
        let object = read_pickle(path)?;

        let params = dict_get(&object, CHECKPOINT_PARAMS_KEY)
            .map(to_value)
            .filter(|value| !value.is_null());

        Ok(Checkpoint {
            path: path.to_path_buf(),
            params,
            has_model: dict_get(&object, CHECKPOINT_MODEL_KEY).is_some(),
        })
    }

    /// The embedded training configuration, if any
    pub fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    /// The embedded training configuration, failing on older checkpoints
    pub fn require_params(&self) -> Result<&Value, PostError> {
        self.params
            .as_ref()
            .ok_or_else(|| PostError::MissingParamsError(self.path.display().to_string()))
    }
}

fn read_error<E: std::fmt::Display>(path: &Path, err: E) -> PostError {
    PostError::CheckpointReadError(format!("{}: {}", path.display(), err))
}

fn read_pickle(path: &Path) -> Result<Object, PostError> {
    let file = File::open(path).map_err(|err| read_error(path, err))?;

    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|err| read_error(path, err))?;

    let name = archive
        .file_names()
        .find(|name| name.ends_with("data.pkl"))
        .map(str::to_string)
        .ok_or_else(|| read_error(path, "archive does not contain a data.pkl entry"))?;

    let entry = archive
        .by_name(&name)
        .map_err(|err| read_error(path, err))?;

    let mut reader = BufReader::new(entry);
    let mut stack = Stack::empty();

    stack
        .read_loop(&mut reader)
        .map_err(|err| read_error(path, err))?;

    stack
        .finalize()
        .map_err(|err| read_error(path, err))
}

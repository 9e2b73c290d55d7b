// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use serde_yaml::{Mapping, Value};

use gdlpost_checkpoint::Checkpoint;
use gdlpost_core::cfg::{PostProcessConfig, merge};
use gdlpost_core::constant;
use gdlpost_core::error::PostError;
use gdlpost_core::io::read_parameters;
use gdlpost_core::ut::track;

use crate::args::PostProcessArgs;

/// Load the run configuration for whichever mode was requested
pub fn load_config(args: &PostProcessArgs) -> Result<PostProcessConfig, PostError> {
    if let Some(param) = &args.param {
        return from_yaml(param, args.verbose);
    }

    match args.input.as_deref() {
        Some([model, rest @ ..]) => from_checkpoint(model, rest.first().map(|p| p.as_path())),
        _ => Err(PostError::OtherError(
            "use the help [-h] option for correct usage".to_string(),
        )),
    }
}

/// Configuration from a yaml file, checked against the checkpoint it names
///
/// A checkpoint that is missing, unreadable or without embedded params only
/// produces a warning. Declared class and band counts that disagree with
/// the checkpoint are fatal.
pub fn from_yaml(path: &Path, verbose: bool) -> Result<PostProcessConfig, PostError> {
    let value = read_parameters(path)?;
    let config = PostProcessConfig::from_value(&value)?;

    let state_dict = &config.inference.state_dict_path;

    if !state_dict.is_file() {
        track::progress_warn(&format!(
            "Checkpoint {} not found. Configuration will not be compared to training parameters.",
            state_dict.display()
        ));
        return Ok(config);
    }

    let checkpoint = match open_checkpoint(state_dict) {
        Ok(checkpoint) => checkpoint,
        Err(err) => {
            track::progress_warn(&format!("{}", err));
            return Ok(config);
        }
    };

    let Some(params) = checkpoint.params() else {
        track::progress_warn(&format!(
            "Checkpoint {} does not contain training parameters. It may be an older format.",
            state_dict.display()
        ));
        return Ok(config);
    };

    let outcome = merge(&value, params, false)?;

    track::progress_log(
        &format!(
            "{} configuration values differ from the training parameters.",
            track::thousands_format(outcome.mismatches.len())
        ),
        verbose,
    );

    verify_against_checkpoint(&config, params)?;

    Ok(config)
}

/// Configuration embedded in a checkpoint
pub fn from_checkpoint(model: &Path, images: Option<&Path>) -> Result<PostProcessConfig, PostError> {
    let checkpoint = open_checkpoint(model)?;
    let mut params = checkpoint.require_params()?.clone();

    let root = params.as_mapping_mut().ok_or_else(|| {
        PostError::ConfigTypeError("Checkpoint params must be a mapping".to_string())
    })?;

    let inference = root
        .entry(Value::from(constant::SECTION_INFERENCE))
        .or_insert(Value::Mapping(Mapping::new()));

    if !inference.is_mapping() {
        *inference = Value::Mapping(Mapping::new());
    }

    if let Some(inference) = inference.as_mapping_mut() {
        inference.insert(
            Value::from("state_dict_path"),
            Value::from(model.to_string_lossy().into_owned()),
        );

        if let Some(images) = images {
            inference.insert(
                Value::from("img_dir_or_csv_file"),
                Value::from(images.to_string_lossy().into_owned()),
            );
        }
    }

    PostProcessConfig::from_value(&params)
}

fn open_checkpoint(path: &Path) -> Result<Checkpoint, PostError> {
    let checkpoint = Checkpoint::open(path)?;

    if !checkpoint.has_model {
        track::progress_warn(&format!(
            "Checkpoint {} has no model entry.",
            path.display()
        ));
    }

    Ok(checkpoint)
}

fn declared_count(params: &Value, key: &str) -> Option<u64> {
    params
        .get(constant::SECTION_GLOBAL)
        .and_then(|global| global.get(key))
        .and_then(Value::as_u64)
}

/// Fail when declared class or band counts disagree with the checkpoint
pub fn verify_against_checkpoint(config: &PostProcessConfig, params: &Value) -> Result<(), PostError> {
    let checks = [
        ("num_classes", config.global.num_classes),
        ("number_of_bands", config.global.number_of_bands),
    ];

    for (key, declared) in checks {
        let (Some(declared), Some(recorded)) = (declared, declared_count(params, key)) else {
            continue;
        };

        if declared as u64 != recorded {
            return Err(PostError::CheckpointMismatchError(format!(
                "Configuration declares {} = {} but the checkpoint was trained with {}",
                key, declared, recorded
            )));
        }
    }

    Ok(())
}

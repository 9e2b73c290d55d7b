// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::PathBuf;

use serde_yaml::{Mapping, Value};

use crate::cfg::resolve::{Lookup, ValueKind, kind_name};
use crate::classes::ClassTable;
use crate::constant;
use crate::error::PostError;

/// The `global` section
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalConfig {
    pub number_of_bands: Option<u32>,
    pub num_classes: Option<u32>,
    pub classes: ClassTable,
}

/// The `inference` section
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    pub state_dict_path: PathBuf,
    pub img_dir_or_csv_file: Option<PathBuf>,
}

/// The `post-processing.buildings` subsection
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingsConfig {
    pub recttol: f64,
    pub compacttol: f64,
    pub patterntol: f64,
    pub orthogonalize_ang_thresh: f64,
}

/// The `post-processing` section
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessingConfig {
    pub r2vect_cellsize_resamp: f64,
    pub removeholesunder: f64,
    pub simptol: f64,
    pub redbenddiamtol: f64,
    pub to_cog: bool,
    pub keep_non_cog: bool,
    pub glob_pattern: String,
    pub max_workers: Option<usize>,
    pub qgis_process: PathBuf,
    pub gdal_translate: PathBuf,
    pub buildings: BuildingsConfig,
}

/// Validated post-processing configuration
///
/// Built once from a loaded yaml tree, after which no further type checks
/// are needed.
///
/// # Examples
///
/// ```
/// use gdlpost_core::cfg::PostProcessConfig;
///
/// let value = serde_yaml::from_str("
/// global:
///   classes: {1: roads}
/// inference:
///   state_dict_path: /models/run/checkpoint.pth.tar
/// post-processing:
///   simptol: 0.5
/// ").unwrap();
///
/// let config = PostProcessConfig::from_value(&value).unwrap();
/// assert_eq!(config.post_processing.simptol, 0.5);
/// assert!(config.post_processing.to_cog);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessConfig {
    pub global: GlobalConfig,
    pub inference: InferenceConfig,
    pub post_processing: PostProcessingConfig,
}

impl PostProcessConfig {
    pub fn from_value(value: &Value) -> Result<Self, PostError> {
        let root = match value {
            Value::Mapping(root) => root,
            other => {
                return Err(PostError::ConfigTypeError(format!(
                    "Configuration root must be a mapping, got {}",
                    kind_name(other)
                )));
            }
        };

        let mut global = section(root, constant::SECTION_GLOBAL)?;
        let mut inference = section(root, constant::SECTION_INFERENCE)?;
        let mut post = section(root, constant::SECTION_POST_PROCESSING)?;
        let mut buildings = section(&post, constant::SECTION_BUILDINGS)?;

        let global = GlobalConfig {
            number_of_bands: optional_u32(&mut global, "number_of_bands")?,
            num_classes: optional_u32(&mut global, "num_classes")?,
            classes: ClassTable::from_value(
                &Lookup::new("classes")
                    .expect(ValueKind::Mapping)
                    .resolve(Some(&mut global))?,
            )?,
        };

        let state_dict_path = Lookup::new("state_dict_path")
            .expect(ValueKind::String)
            .resolve(Some(&mut inference))?;

        let state_dict_path = match state_dict_path.as_str() {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => return Err(PostError::MissingKeyError("inference.state_dict_path")),
        };

        let img_dir_or_csv_file = Lookup::new("img_dir_or_csv_file")
            .expect(ValueKind::String)
            .resolve(Some(&mut inference))?
            .as_str()
            .map(PathBuf::from);

        let inference = InferenceConfig {
            state_dict_path,
            img_dir_or_csv_file,
        };

        let buildings = BuildingsConfig {
            recttol: number(&mut buildings, "recttol", constant::DEFAULT_RECTANGULARITY_TOLERANCE)?,
            compacttol: number(&mut buildings, "compacttol", constant::DEFAULT_COMPACTNESS_TOLERANCE)?,
            patterntol: number(&mut buildings, "patterntol", constant::DEFAULT_PATTERN_TOLERANCE)?,
            orthogonalize_ang_thresh: as_f64(
                &Lookup::new(&["orthomaxtol", "orthogonalize_ang_thresh"])
                    .default(constant::DEFAULT_ORTHOGONALIZE_ANGLE_THRESHOLD)
                    .expect(ValueKind::Number)
                    .resolve(Some(&mut buildings))?,
                constant::DEFAULT_ORTHOGONALIZE_ANGLE_THRESHOLD,
            ),
        };

        let max_workers = match optional_u32(&mut post, "max_workers")? {
            Some(0) => {
                return Err(PostError::ConfigTypeError(
                    "post-processing.max_workers must be a positive integer".to_string(),
                ));
            }
            other => other.map(|n| n as usize),
        };

        let post_processing = PostProcessingConfig {
            r2vect_cellsize_resamp: number(&mut post, "r2vect_cellsize_resamp", constant::DEFAULT_CELLSIZE_RESAMP)?,
            removeholesunder: number(&mut post, "removeholesunder", constant::DEFAULT_REMOVE_HOLES_UNDER)?,
            simptol: number(&mut post, "simptol", constant::DEFAULT_SIMPLIFY_TOLERANCE)?,
            redbenddiamtol: number(&mut post, "redbenddiamtol", constant::DEFAULT_REDUCE_BEND_TOLERANCE)?,
            to_cog: boolean(&mut post, "to_cog", true)?,
            keep_non_cog: boolean(&mut post, "keep_non_cog", true)?,
            glob_pattern: string(&mut post, "glob_pattern", constant::DEFAULT_GLOB_PATTERN)?,
            max_workers,
            qgis_process: PathBuf::from(string(&mut post, "qgis_process", constant::DEFAULT_QGIS_PROCESS)?),
            gdal_translate: PathBuf::from(string(&mut post, "gdal_translate", constant::DEFAULT_GDAL_TRANSLATE)?),
            buildings,
        };

        Ok(PostProcessConfig {
            global,
            inference,
            post_processing,
        })
    }

    /// Directory holding the checkpoint, which roots input discovery
    pub fn working_folder(&self) -> PathBuf {
        self.inference
            .state_dict_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn section(parent: &Mapping, key: &str) -> Result<Mapping, PostError> {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(Mapping::new()),
        Some(Value::Mapping(mapping)) => Ok(mapping.clone()),
        Some(other) => Err(PostError::ConfigTypeError(format!(
            "Section {} must be a mapping, got {}",
            key,
            kind_name(other)
        ))),
    }
}

fn as_f64(value: &Value, default: f64) -> f64 {
    value
        .as_f64()
        .or_else(|| value.as_i64().map(|v| v as f64))
        .unwrap_or(default)
}

fn number(config: &mut Mapping, key: &str, default: f64) -> Result<f64, PostError> {
    let value = Lookup::new(key)
        .default(default)
        .expect(ValueKind::Number)
        .resolve(Some(config))?;
    Ok(as_f64(&value, default))
}

fn boolean(config: &mut Mapping, key: &str, default: bool) -> Result<bool, PostError> {
    let value = Lookup::new(key)
        .default(default)
        .expect(ValueKind::Bool)
        .resolve(Some(config))?;
    Ok(value.as_bool().unwrap_or(default))
}

fn string(config: &mut Mapping, key: &str, default: &str) -> Result<String, PostError> {
    let value = Lookup::new(key)
        .default(default)
        .expect(ValueKind::String)
        .resolve(Some(config))?;
    Ok(value.as_str().unwrap_or(default).to_string())
}

fn optional_u32(config: &mut Mapping, key: &str) -> Result<Option<u32>, PostError> {
    let value = Lookup::new(key)
        .expect(ValueKind::Int)
        .resolve(Some(config))?;

    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                PostError::ConfigTypeError(format!("{} must be a non-negative integer", key))
            }),
        _ => Ok(None),
    }
}

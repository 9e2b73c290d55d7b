// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::constant::TEMP_DIR_PREFIX;
use crate::error::PostError;

/// Paths derived from a single inference raster
///
/// Every output is placed beside the source raster and named after its
/// stem, so two different inputs never share an output path.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use gdlpost_core::ut::path::InferenceArtifacts;
///
/// let artifacts = InferenceArtifacts::new("run/inference_3bands/tile_inference.tif").unwrap();
///
/// assert_eq!(artifacts.final_gpkg, PathBuf::from("run/inference_3bands/tile_inference.gpkg"));
/// assert_eq!(artifacts.cog, PathBuf::from("run/inference_3bands/tile_inference_cog.tif"));
///
/// let (raw, fin) = artifacts.class_outputs("roads");
/// assert_eq!(raw, PathBuf::from("run/inference_3bands/tile_inference_roads_raw.gpkg"));
/// assert_eq!(fin, PathBuf::from("run/inference_3bands/tile_inference_roads_final.gpkg"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceArtifacts {
    pub source: PathBuf,
    pub stem: String,
    pub final_gpkg: PathBuf,
    pub cog: PathBuf,
}

impl InferenceArtifacts {
    pub fn new<P: AsRef<Path>>(source: P) -> Result<Self, PostError> {
        let source = source.as_ref().to_path_buf();

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PostError::OtherError(format!("Invalid inference file name {}", source.display()))
            })?
            .to_string();

        let parent = source.parent().unwrap_or_else(|| Path::new("")).to_path_buf();

        let cog_name = match source.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}_cog.{}", stem, ext),
            None => format!("{}_cog", stem),
        };

        Ok(InferenceArtifacts {
            final_gpkg: parent.join(format!("{}.gpkg", stem)),
            cog: parent.join(cog_name),
            source,
            stem,
        })
    }

    fn parent(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Raw and final per-class geopackages
    pub fn class_outputs(&self, class_name: &str) -> (PathBuf, PathBuf) {
        let parent = self.parent();
        (
            parent.join(format!("{}_{}_raw.gpkg", self.stem, class_name)),
            parent.join(format!("{}_{}_final.gpkg", self.stem, class_name)),
        )
    }
}

/// Collect files matching a glob pattern rooted at a directory
///
/// # Arguments
///
/// * `root` - Directory the pattern is relative to
/// * `pattern` - Glob pattern (e.g. `**/*_inference.tif`)
///
/// # Examples
///
/// ```no_run
/// use gdlpost_core::ut::path::collect_inference_paths;
/// let files = collect_inference_paths("models/run_1", "inference_?bands/*_inference.tif");
/// ```
pub fn collect_inference_paths<P: AsRef<Path>>(
    root: P,
    pattern: &str,
) -> Result<Vec<PathBuf>, PostError> {
    let root = root.as_ref();

    let root_str = root
        .to_str()
        .ok_or_else(|| PostError::PatternError(format!("Non utf-8 directory {}", root.display())))?;

    let full = format!(
        "{}/{}",
        glob::Pattern::escape(root_str.trim_end_matches('/')),
        pattern.trim_start_matches('/')
    );

    let mut files: Vec<PathBuf> = glob::glob(&full)
        .map_err(|err| PostError::PatternError(format!("{}: {}", pattern, err)))?
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect();

    files.sort_unstable();

    Ok(files)
}

/// Create a uniquely named temporary directory and return a geopackage
/// path inside it
pub fn temporary_gpkg() -> Result<PathBuf, PostError> {
    let dir = std::env::temp_dir().join(format!("{}-{}", TEMP_DIR_PREFIX, short_id()));
    std::fs::create_dir_all(&dir)
        .map_err(|err| PostError::IoError(format!("{}: {}", dir.display(), err)))?;
    Ok(dir.join(format!("{}.gpkg", short_id())))
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

/// Remove a file, treating an already missing file as success
///
/// Returns whether a file was removed.
pub fn remove_file_if_exists<P: AsRef<Path>>(path: P) -> Result<bool, PostError> {
    match std::fs::remove_file(path.as_ref()) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(PostError::IoError(format!(
            "{}: {}",
            path.as_ref().display(),
            err
        ))),
    }
}

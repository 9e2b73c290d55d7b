// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use gdlpost_core::cfg::PostProcessingConfig;
use gdlpost_core::classes::{ClassPlan, ClassTable};
use gdlpost_core::cmd::{CommandRunner, Templates, ToolCommand, execute};
use gdlpost_core::error::PostError;
use gdlpost_core::ut::path::{InferenceArtifacts, remove_file_if_exists, temporary_gpkg};
use gdlpost_core::ut::track;

/// Everything a worker needs to post-process one inference
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub config: PostProcessingConfig,
    pub classes: ClassTable,
    pub plan: ClassPlan,
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Ran,
    Skipped,
    Disabled,
}

/// What happened to a single inference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceReport {
    pub vector: StageStatus,
    pub cog: StageStatus,
    pub removed_source: bool,
}

/// Run vectorize -> simplify -> package -> COG for one inference raster
///
/// Stages whose destination already exists are skipped. External tool
/// failures, including tools that cannot be started, are reported but do
/// not stop the following stages. A tool that could not be started marks
/// the inference as failed once every stage has run.
pub fn process_inference<R: CommandRunner + ?Sized>(
    runner: &R,
    context: &PipelineContext,
    source: &Path,
) -> Result<InferenceReport, PostError> {
    let artifacts = InferenceArtifacts::new(source)?;
    let templates = Templates::new(&context.config);
    let verbose = context.verbose;
    let mut spawn_error: Option<PostError> = None;

    let mut run = |command: &ToolCommand| {
        if let Err(err) = execute(runner, command, verbose) {
            track::progress_warn(&format!("{} Continuing with the next stage.", err));
            if spawn_error.is_none() {
                spawn_error = Some(err);
            }
        }
    };

    track::progress_log(&format!("Post-processing {}", source.display()), verbose);

    let vector = if artifacts.final_gpkg.is_file() {
        track::progress_warn(&format!(
            "Output geopackage exists: {}. Skipping vectorization.",
            artifacts.final_gpkg.display()
        ));
        StageStatus::Skipped
    } else {
        let rtovect = temporary_gpkg()?;

        run(&templates.vectorize(source, &rtovect));
        run(&templates.simplify(context.plan, &context.classes, &rtovect, &artifacts));
        run(&templates.package(&context.classes, &artifacts));

        StageStatus::Ran
    };

    if !context.config.to_cog {
        return match spawn_error {
            Some(err) => Err(err),
            None => Ok(InferenceReport {
                vector,
                cog: StageStatus::Disabled,
                removed_source: false,
            }),
        };
    }

    let cog = if artifacts.cog.is_file() {
        track::progress_warn(&format!(
            "Output cog exists: {}. Skipping conversion.",
            artifacts.cog.display()
        ));
        StageStatus::Skipped
    } else {
        run(&templates.cog(&artifacts));
        StageStatus::Ran
    };

    let mut removed_source = false;

    if !context.config.keep_non_cog && artifacts.cog.is_file() {
        match remove_file_if_exists(&artifacts.source) {
            Ok(removed) => {
                removed_source = removed;
                if removed {
                    track::progress_log(
                        &format!("Removed non-cog raster {}", artifacts.source.display()),
                        verbose,
                    );
                }
            }
            Err(err) => {
                track::progress_warn(&format!("{} Non-cog raster retained.", err));
            }
        }
    }

    if let Some(err) = spawn_error {
        return Err(err);
    }

    Ok(InferenceReport {
        vector,
        cog,
        removed_source,
    })
}

#[cfg(test)]
mod test {

    use std::path::PathBuf;

    use super::*;
    use crate::pipeline::testing::{RecordingRunner, context};

    fn inference(dir: &Path, name: &str) -> PathBuf {
        let bands = dir.join("inference_3bands");
        std::fs::create_dir_all(&bands).unwrap();
        let path = bands.join(name);
        std::fs::write(&path, b"raster").unwrap();
        path
    }

    #[test]
    fn test_roads_only_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let source = inference(dir.path(), "tile_inference.tif");
        let runner = RecordingRunner::new();
        let context = context(ClassTable::new([(1, "roads")]).unwrap(), true, true);

        let report = process_inference(&runner, &context, &source).unwrap();
        assert_eq!(report.vector, StageStatus::Ran);
        assert_eq!(report.cog, StageStatus::Ran);
        assert!(!report.removed_source);

        let commands = runner.commands();
        assert_eq!(commands.len(), 4);
        assert!(commands[0].mentions("model:r2vect"));
        assert!(commands[1].mentions("model:simplify-road"));
        assert!(commands[2].mentions("native:package"));
        assert_eq!(commands[3].program(), Path::new("gdal_translate"));

        assert!(
            commands
                .iter()
                .all(|c| !c.mentions("model:simplify-buildings") && !c.mentions("model:simplify-4classes"))
        );
    }

    #[test]
    fn test_four_classes_with_background_shift() {
        let dir = tempfile::tempdir().unwrap();
        let source = inference(dir.path(), "tile_inference.tif");
        let runner = RecordingRunner::new();
        let classes = ClassTable::new([(0, "forest"), (1, "roads"), (2, "buildings"), (3, "hydro")]).unwrap();
        let context = context(classes, false, true);

        let report = process_inference(&runner, &context, &source).unwrap();
        assert_eq!(report.cog, StageStatus::Disabled);

        let commands = runner.commands();
        assert_eq!(commands.len(), 3);
        assert!(commands[1].mentions("model:simplify-4classes"));
        assert!(commands[1].mentions("attrnum1=1"));
        assert!(commands[1].mentions("attrnum4=4"));
        assert!(!commands[1].mentions("attrnum1=0"));
    }

    #[test]
    fn test_existing_geopackage_skips_vector_stages() {
        let dir = tempfile::tempdir().unwrap();
        let source = inference(dir.path(), "myfile.tif");
        std::fs::write(source.with_file_name("myfile.gpkg"), b"").unwrap();

        let runner = RecordingRunner::new();
        let context = context(ClassTable::new([(1, "roads")]).unwrap(), true, true);

        let report = process_inference(&runner, &context, &source).unwrap();
        assert_eq!(report.vector, StageStatus::Skipped);
        assert_eq!(report.cog, StageStatus::Ran);

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert!(
            commands
                .iter()
                .filter(|c| c.program() == Path::new("qgis_process"))
                .all(|c| !c.mentions("myfile"))
        );
        assert!(commands[0].mentions("myfile_cog.tif"));
    }

    #[test]
    fn test_existing_cog_is_not_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let source = inference(dir.path(), "tile_inference.tif");
        std::fs::write(source.with_file_name("tile_inference.gpkg"), b"").unwrap();
        std::fs::write(source.with_file_name("tile_inference_cog.tif"), b"").unwrap();

        let runner = RecordingRunner::new();
        let context = context(ClassTable::new([(1, "roads")]).unwrap(), true, true);

        let report = process_inference(&runner, &context, &source).unwrap();
        assert_eq!(report.cog, StageStatus::Skipped);
        assert!(runner.commands().is_empty());
        assert!(source.exists());
    }

    #[test]
    fn test_non_cog_source_removed() {
        let dir = tempfile::tempdir().unwrap();
        let source = inference(dir.path(), "tile_inference.tif");
        let runner = RecordingRunner::new();
        let context = context(ClassTable::new([(1, "buildings")]).unwrap(), true, false);

        let report = process_inference(&runner, &context, &source).unwrap();
        assert!(report.removed_source);
        assert!(!source.exists());
        assert!(source.with_file_name("tile_inference_cog.tif").exists());

        // A second pass finds the source already gone
        let report = process_inference(&runner, &context, &source).unwrap();
        assert!(!report.removed_source);
        assert_eq!(report.cog, StageStatus::Skipped);
    }

    #[test]
    fn test_missing_tool_still_converts_cog() {
        let dir = tempfile::tempdir().unwrap();
        let source = inference(dir.path(), "tile_inference.tif");
        let runner = RecordingRunner::unavailable("qgis_process");
        let context = context(ClassTable::new([(1, "roads")]).unwrap(), true, true);

        let result = process_inference(&runner, &context, &source);
        assert!(matches!(result, Err(PostError::ProcessError(_))));

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].program(), Path::new("gdal_translate"));
        assert!(source.with_file_name("tile_inference_cog.tif").exists());
        assert!(source.exists());
    }

    #[test]
    fn test_missing_tool_without_cog() {
        let dir = tempfile::tempdir().unwrap();
        let source = inference(dir.path(), "tile_inference.tif");
        let runner = RecordingRunner::unavailable("qgis_process");
        let context = context(ClassTable::new([(1, "roads")]).unwrap(), false, true);

        let result = process_inference(&runner, &context, &source);
        assert!(matches!(result, Err(PostError::ProcessError(_))));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_failed_cog_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = inference(dir.path(), "tile_inference.tif");
        let runner = RecordingRunner::failing();
        let context = context(ClassTable::new([(1, "roads")]).unwrap(), true, false);

        let report = process_inference(&runner, &context, &source).unwrap();
        assert_eq!(report.vector, StageStatus::Ran);
        assert!(!report.removed_source);
        assert!(source.exists());
        assert_eq!(runner.commands().len(), 4);
    }
}

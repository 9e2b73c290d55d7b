// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::PathBuf;
use std::sync::Arc;

use gdlpost_core::cmd::{CommandRunner, ProcessRunner};
use gdlpost_core::error::PostError;
use gdlpost_core::ut::{path, track};

use crate::args::PostProcessArgs;
use crate::setup::load_config;

mod pool;
mod stages;

#[cfg(test)]
mod testing;

pub use pool::run_all;
pub use stages::{InferenceReport, PipelineContext, StageStatus, process_inference};

/// Outcome of a complete post-processing run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: Vec<(PathBuf, InferenceReport)>,
    pub failed: Vec<(PathBuf, PostError)>,
}

pub fn post_process(args: &PostProcessArgs) {
    let summary = try_post_process(args, Arc::new(ProcessRunner)).unwrap_or_else(|err| {
        eprintln!("[gdlpost::pipeline] ERROR: {}", err);
        std::process::exit(1);
    });

    for (source, err) in summary.failed.iter() {
        eprintln!("[gdlpost::pipeline] ERROR: {} | {}", source.display(), err);
    }

    if !summary.failed.is_empty() {
        eprintln!(
            "[gdlpost::pipeline] ERROR: {} of {} inferences failed to post-process.",
            summary.failed.len(),
            summary.failed.len() + summary.processed.len()
        );
        std::process::exit(1);
    }
}

/// Number of inferences processed concurrently
///
/// The command line wins over the configuration, which wins over the
/// available parallelism. Never more than the number of files.
pub fn worker_count(threads: Option<usize>, max_workers: Option<usize>, files: usize) -> usize {
    let requested = threads.or(max_workers).unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });

    requested.min(files).max(1)
}

/// Resolve the configuration, discover inferences and post-process them
pub fn try_post_process<R: CommandRunner + 'static>(
    args: &PostProcessArgs,
    runner: Arc<R>,
) -> Result<RunSummary, PostError> {
    let config = load_config(args)?;
    let classes = config.global.classes.clone();
    let plan = classes.plan()?;

    if let Some(declared) = config.global.num_classes {
        if declared as usize != classes.len() {
            track::progress_warn(&format!(
                "num_classes is {} but {} classes are listed. Using the listed classes.",
                declared,
                classes.len()
            ));
        }
    }

    if let Some(images) = &config.inference.img_dir_or_csv_file {
        track::progress_log(
            &format!("Images used for inference: {}", images.display()),
            args.verbose,
        );
    }

    let working_folder = config.working_folder();
    let post = config.post_processing;

    let files = path::collect_inference_paths(&working_folder, &post.glob_pattern)?;

    track::progress_log(
        &format!(
            "Found {} inferences to post-process in {}",
            track::thousands_format(files.len()),
            working_folder.display()
        ),
        args.verbose,
    );

    if files.is_empty() {
        if args.allow_empty {
            track::progress_log(
                &format!(
                    "No inference matching {} in {}",
                    post.glob_pattern,
                    working_folder.display()
                ),
                args.verbose,
            );
            return Ok(RunSummary::default());
        }

        return Err(PostError::NothingToProcessError(format!(
            "No inference matching {} in {}",
            post.glob_pattern,
            working_folder.display()
        )));
    }

    let workers = worker_count(args.threads, post.max_workers, files.len());

    track::progress_log(
        &format!("Post-processing with {} workers", workers),
        args.verbose,
    );

    let context = Arc::new(PipelineContext {
        config: post,
        classes,
        plan,
        verbose: args.verbose,
    });

    let rt = tokio::runtime::Runtime::new()?;
    let results = rt.block_on(run_all(files, runner, context, workers));

    let mut summary = RunSummary::default();

    for (source, result) in results {
        match result {
            Ok(report) => summary.processed.push((source, report)),
            Err(err) => summary.failed.push((source, err)),
        }
    }

    summary.processed.sort_by(|a, b| a.0.cmp(&b.0));
    summary.failed.sort_by(|a, b| a.0.cmp(&b.0));

    track::progress_log(
        &format!(
            "Post-processed {} inferences, {} failed",
            track::thousands_format(summary.processed.len()),
            summary.failed.len()
        ),
        args.verbose,
    );

    Ok(summary)
}

#[cfg(test)]
mod test {

    use std::path::Path;

    use super::*;
    use super::testing::RecordingRunner;

    fn args(config: &Path, allow_empty: bool) -> PostProcessArgs {
        PostProcessArgs {
            param: Some(config.to_path_buf()),
            input: None,
            verbose: false,
            threads: Some(2),
            allow_empty,
        }
    }

    fn write_config(dir: &Path, classes: &str) -> PathBuf {
        let path = dir.join("config.yaml");
        std::fs::write(
            &path,
            format!(
                "global:\n  classes: {}\ninference:\n  state_dict_path: {}\npost-processing:\n  keep_non_cog: false\n",
                classes,
                dir.join("model.pth").display()
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(Some(4), Some(2), 10), 4);
        assert_eq!(worker_count(None, Some(2), 10), 2);
        assert_eq!(worker_count(Some(8), None, 3), 3);
        assert_eq!(worker_count(Some(0), None, 3), 1);
        assert!(worker_count(None, None, 100) >= 1);
    }

    #[test]
    fn test_try_post_process() {
        let dir = tempfile::tempdir().unwrap();
        let bands = dir.path().join("inference_3bands");
        std::fs::create_dir_all(&bands).unwrap();

        for name in ["a_inference.tif", "b_inference.tif", "c_other.tif"] {
            std::fs::write(bands.join(name), b"raster").unwrap();
        }

        let config = write_config(dir.path(), "{1: roads}");
        let runner = Arc::new(RecordingRunner::new());

        let summary = try_post_process(&args(&config, false), runner.clone()).unwrap();

        assert!(summary.failed.is_empty());
        assert_eq!(summary.processed.len(), 2);
        assert_eq!(summary.processed[0].0, bands.join("a_inference.tif"));
        assert!(summary.processed.iter().all(|(_, r)| r.removed_source));

        assert_eq!(runner.commands().len(), 8);
        assert!(bands.join("a_inference_cog.tif").exists());
        assert!(bands.join("c_other.tif").exists());
    }

    #[test]
    fn test_unavailable_tool_fails_file_after_cog() {
        let dir = tempfile::tempdir().unwrap();
        let bands = dir.path().join("inference_3bands");
        std::fs::create_dir_all(&bands).unwrap();
        std::fs::write(bands.join("a_inference.tif"), b"raster").unwrap();

        let config = write_config(dir.path(), "{1: roads}");
        let runner = Arc::new(RecordingRunner::unavailable("qgis_process"));

        let summary = try_post_process(&args(&config, false), runner).unwrap();

        assert!(summary.processed.is_empty());
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(summary.failed[0].1, PostError::ProcessError(_)));
        assert!(bands.join("a_inference_cog.tif").exists());
    }

    #[test]
    fn test_nothing_to_process() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "{1: roads}");

        let result = try_post_process(&args(&config, false), Arc::new(RecordingRunner::new()));
        assert!(matches!(result, Err(PostError::NothingToProcessError(_))));

        let summary = try_post_process(&args(&config, true), Arc::new(RecordingRunner::new())).unwrap();
        assert!(summary.processed.is_empty());
        assert!(summary.failed.is_empty());
    }

    #[test]
    fn test_unsupported_classes() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "{1: roads, 2: buildings}");

        let result = try_post_process(&args(&config, true), Arc::new(RecordingRunner::new()));
        assert!(matches!(result, Err(PostError::UnsupportedClassesError(2))));
    }
}

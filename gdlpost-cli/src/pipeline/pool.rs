// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt};
use kdam::BarExt;

use gdlpost_core::cmd::CommandRunner;
use gdlpost_core::error::PostError;
use gdlpost_core::ut::track;

use crate::pipeline::stages::{InferenceReport, PipelineContext, process_inference};

/// Post-process every inference with at most `workers` running at once
///
/// Results are returned in completion order.
pub async fn run_all<R: CommandRunner + 'static>(
    files: Vec<PathBuf>,
    runner: Arc<R>,
    context: Arc<PipelineContext>,
    workers: usize,
) -> Vec<(PathBuf, Result<InferenceReport, PostError>)> {
    let verbose = context.verbose;

    let pb = Arc::new(Mutex::new(track::progress_bar(
        files.len(),
        "Post-processing",
        verbose,
    )));

    stream::iter(files)
        .map(|source| {
            let runner = runner.clone();
            let context = context.clone();
            let pb_clone = pb.clone();

            async move {
                let path = source.clone();
                let result = tokio::task::spawn_blocking(move || {
                    process_inference(runner.as_ref(), &context, &source)
                })
                .await
                .unwrap_or_else(|err| {
                    Err(PostError::ProcessError(format!(
                        "Worker stopped unexpectedly. {}",
                        err
                    )))
                });

                if verbose {
                    if let Ok(mut pb) = pb_clone.lock() {
                        let _ = pb.update(1);
                    }
                }

                (path, result)
            }
        })
        .buffer_unordered(workers.max(1))
        .collect::<Vec<_>>()
        .await
}

// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use gdlpost_core::cfg::PostProcessConfig;
use gdlpost_core::classes::ClassTable;
use gdlpost_core::cmd::{CommandRunner, ToolCommand, ToolOutput};
use gdlpost_core::error::PostError;

use crate::pipeline::stages::PipelineContext;

/// Records commands instead of running them
///
/// Successful runs create the files the real tools would write so later
/// stages see them on disk.
#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<ToolCommand>>,
    failing: bool,
    unavailable: Option<PathBuf>,
    delay: Option<Duration>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    pub fn failing() -> Self {
        RecordingRunner {
            failing: true,
            ..Default::default()
        }
    }

    /// Fail to start the given program, as if it were not installed
    pub fn unavailable<P: AsRef<Path>>(program: P) -> Self {
        RecordingRunner {
            unavailable: Some(program.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        RecordingRunner {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn commands(&self) -> Vec<ToolCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, PostError> {
        if self.unavailable.as_deref() == Some(command.program()) {
            return Err(PostError::ProcessError(format!(
                "{}: No such file or directory",
                command.program().display()
            )));
        }

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        self.commands.lock().unwrap().push(command.clone());

        let status = if self.failing {
            Some(1)
        } else {
            create_outputs(command);
            Some(0)
        };

        self.active.fetch_sub(1, Ordering::SeqCst);

        Ok(ToolOutput {
            status,
            stdout: String::new(),
            stderr: if self.failing { "failed".to_string() } else { String::new() },
        })
    }
}

fn create_outputs(command: &ToolCommand) {
    if command.program() == Path::new("gdal_translate") {
        if let Some(dst) = command.argv().get(1) {
            std::fs::write(dst, b"cog").unwrap();
        }
        return;
    }

    for arg in command.argv() {
        if let Some(output) = arg.to_str().and_then(|a| a.strip_prefix("OUTPUT=")) {
            std::fs::write(output, b"gpkg").unwrap();
        }
    }
}

pub fn context(classes: ClassTable, to_cog: bool, keep_non_cog: bool) -> PipelineContext {
    let value = serde_yaml::from_str(&format!(
        "inference: {{state_dict_path: model.pth}}\npost-processing: {{to_cog: {}, keep_non_cog: {}}}",
        to_cog, keep_non_cog
    ))
    .unwrap();

    let config = PostProcessConfig::from_value(&value).unwrap();
    let plan = classes.plan().unwrap();

    PipelineContext {
        config: config.post_processing,
        classes,
        plan,
        verbose: false,
    }
}

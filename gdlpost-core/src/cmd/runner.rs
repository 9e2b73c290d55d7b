// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::process::{Command, Stdio};

use crate::cmd::command::{ToolCommand, ToolOutput};
use crate::error::PostError;
use crate::ut::track;

/// Executes external tool commands
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture its output
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, PostError>;
}

/// Runs commands as blocking child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, PostError> {
        let output = Command::new(command.program())
            .args(command.argv())
            .stdin(Stdio::null())
            .output()
            .map_err(|err| PostError::ProcessError(format!("{}: {}", command.program().display(), err)))?;

        Ok(ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a command and report its output
///
/// Standard output is logged, a non-empty error stream or a failed exit
/// status is reported as a warning. Neither stops the caller; only a
/// command that cannot be started is an error.
pub fn execute<R: CommandRunner + ?Sized>(
    runner: &R,
    command: &ToolCommand,
    verbose: bool,
) -> Result<ToolOutput, PostError> {
    track::progress_log(&format!("Executing: {}", command), verbose);

    let output = runner.run(command)?;

    let stdout = output.stdout.trim();
    if !stdout.is_empty() {
        track::progress_log(stdout, verbose);
    }

    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        track::progress_warn(&format!("{}: {}", command.program().display(), stderr));
    }

    if !output.success() {
        track::progress_warn(&format!(
            "{} exited with status {}.",
            command.program().display(),
            output
                .status
                .map(|code| code.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ));
    }

    Ok(output)
}

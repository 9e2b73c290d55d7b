// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// An external tool invocation as an executable and an argument vector
///
/// Arguments are handed to the operating system as-is and are never
/// interpreted by a shell.
///
/// # Examples
///
/// ```
/// use gdlpost_core::cmd::ToolCommand;
///
/// let command = ToolCommand::new("qgis_process")
///     .args(["run", "model:r2vect", "--"])
///     .param("inputraster", "tile_inference.tif")
///     .param("cellsizeresamp", 0);
///
/// assert_eq!(command.argv().len(), 5);
/// assert_eq!(command.argv()[3], "inputraster=tile_inference.tif");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new<P: AsRef<Path>>(program: P) -> Self {
        ToolCommand {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Append a single argument
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    /// Append a `key=value` argument
    pub fn param<V: fmt::Display>(self, key: &str, value: V) -> Self {
        let arg = format!("{}={}", key, value);
        self.arg(arg)
    }

    /// Append a `key=path` argument without lossy conversion
    pub fn path_param<P: AsRef<Path>>(self, key: &str, path: P) -> Self {
        let mut arg = OsString::from(format!("{}=", key));
        arg.push(path.as_ref().as_os_str());
        self.arg(arg)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn argv(&self) -> &[OsString] {
        &self.args
    }

    /// Whether any argument mentions the given text
    pub fn mentions(&self, needle: &str) -> bool {
        self.args
            .iter()
            .any(|arg| arg.to_string_lossy().contains(needle))
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished external tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_path_param_keeps_spaces_in_one_argument() {
        let command = ToolCommand::new("gdal_translate")
            .path_param("OUTPUT", "my dir/out.gpkg")
            .arg("-co")
            .arg("TILED=YES");

        assert_eq!(command.argv().len(), 3);
        assert_eq!(command.argv()[0], "OUTPUT=my dir/out.gpkg");
        assert_eq!(
            command.to_string(),
            "gdal_translate \"OUTPUT=my dir/out.gpkg\" -co TILED=YES"
        );
    }

    #[test]
    fn test_mentions() {
        let command = ToolCommand::new("qgis_process").param("classname", "roads");
        assert!(command.mentions("roads"));
        assert!(!command.mentions("buildings"));
    }

    #[test]
    fn test_output_success() {
        let output = ToolOutput {
            status: Some(0),
            ..Default::default()
        };
        assert!(output.success());
        assert!(!ToolOutput::default().success());
    }
}

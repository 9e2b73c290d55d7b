// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

mod command;
mod runner;
mod templates;

pub use command::{ToolCommand, ToolOutput};
pub use runner::{CommandRunner, ProcessRunner, execute};
pub use templates::Templates;

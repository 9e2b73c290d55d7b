// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt;

#[derive(Debug, Clone)]
pub enum PostError {
    ConfigReadError(String),
    ConfigParseError(String),
    ConfigTypeError(String),
    MissingKeyError(&'static str),
    CandidateKeysError(String),
    MergeTypeError(String),
    UnsupportedClassesError(usize),
    MissingParamsError(String),
    CheckpointReadError(String),
    CheckpointMismatchError(String),
    NothingToProcessError(String),
    PatternError(String),
    ProcessError(String),
    IoError(String),
    OtherError(String),
}

impl fmt::Display for PostError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PostError::ConfigReadError(message) => {
                write!(
                    f,
                    "[gdlpost::ConfigReadError] Configuration file could not be read. {}.",
                    message
                )
            }
            PostError::ConfigParseError(message) => {
                write!(
                    f,
                    "[gdlpost::ConfigParseError] Configuration file is not valid yaml. {}.",
                    message
                )
            }
            PostError::ConfigTypeError(message) => {
                write!(f, "[gdlpost::ConfigTypeError] {}.", message)
            }
            PostError::MissingKeyError(key) => {
                write!(
                    f,
                    "[gdlpost::MissingKeyError] Required configuration key {} is missing.",
                    key
                )
            }
            PostError::CandidateKeysError(message) => {
                write!(f, "[gdlpost::CandidateKeysError] {}.", message)
            }
            PostError::MergeTypeError(message) => {
                write!(
                    f,
                    "[gdlpost::MergeTypeError] Expected both configurations to be mappings. {}.",
                    message
                )
            }
            PostError::UnsupportedClassesError(n) => {
                write!(
                    f,
                    "[gdlpost::UnsupportedClassesError] Post-processing is supported for a single roads class, a single buildings class or exactly 4 classes. Got {} classes.",
                    n
                )
            }
            PostError::MissingParamsError(message) => {
                write!(
                    f,
                    "[gdlpost::MissingParamsError] Checkpoint does not contain a params entry and is likely an older format. {}.",
                    message
                )
            }
            PostError::CheckpointReadError(message) => {
                write!(
                    f,
                    "[gdlpost::CheckpointReadError] Checkpoint could not be read. {}.",
                    message
                )
            }
            PostError::CheckpointMismatchError(message) => {
                write!(f, "[gdlpost::CheckpointMismatchError] {}.", message)
            }
            PostError::NothingToProcessError(message) => {
                write!(
                    f,
                    "[gdlpost::NothingToProcessError] No inference found to post-process. {}.",
                    message
                )
            }
            PostError::PatternError(message) => {
                write!(f, "[gdlpost::PatternError] Invalid glob pattern. {}.", message)
            }
            PostError::ProcessError(message) => {
                write!(
                    f,
                    "[gdlpost::ProcessError] External tool could not be executed. {}.",
                    message
                )
            }
            PostError::IoError(message) => {
                write!(f, "[gdlpost::IoError] {}.", message)
            }
            PostError::OtherError(message) => {
                write!(f, "[gdlpost::OtherError] Error: {}.", message)
            }
        }
    }
}

impl std::error::Error for PostError {}

impl From<std::io::Error> for PostError {
    fn from(err: std::io::Error) -> Self {
        PostError::IoError(err.to_string())
    }
}

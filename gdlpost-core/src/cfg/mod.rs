// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

pub mod merge;
pub mod resolve;
pub mod schema;

pub use merge::{MergeOutcome, Mismatch, merge};
pub use resolve::{Key, Lookup, ValueKind, resolve};
pub use schema::{BuildingsConfig, GlobalConfig, InferenceConfig, PostProcessConfig, PostProcessingConfig};

// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

pub mod cfg;
pub mod classes;
pub mod cmd;
pub mod constant;
pub mod error;
pub mod io;
pub mod ut;

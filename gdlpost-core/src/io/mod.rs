// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

mod yaml;

pub use yaml::read_parameters;

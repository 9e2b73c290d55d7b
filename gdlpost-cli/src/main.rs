// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use clap::Parser;
use gdlpost_cli::{args::PostProcessArgs, pipeline};

fn main() {
    let args = PostProcessArgs::parse();
    pipeline::post_process(&args);
}

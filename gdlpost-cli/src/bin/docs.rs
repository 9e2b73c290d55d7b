#![allow(clippy::all)]
use clap_markdown;

use gdlpost_cli::args::PostProcessArgs;

fn main() {
    clap_markdown::print_help_markdown::<PostProcessArgs>();
}

// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Debug, Parser)]
#[command(name = "gdlpost", version, long_about = None)]
#[command(about = "Post-processing of inference created by geo-deep-learning.")]
#[command(group(ArgGroup::new("mode").required(true).args(["param", "input"])))]
pub struct PostProcessArgs {
    #[arg(
        short = 'p',
        long,
        value_name = "YAML_FILE",
        help = "Path to parameters stored in yaml."
    )]
    pub param: Option<PathBuf>,

    #[arg(
        short = 'i',
        long,
        num_args = 1..=2,
        value_names = ["MODEL", "IMAGES"],
        help = "Model checkpoint and optionally the image directory or csv used for inference."
    )]
    pub input: Option<Vec<PathBuf>>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,

    #[arg(
        short = 't',
        long,
        help = "Maximum number of inferences post-processed concurrently."
    )]
    pub threads: Option<usize>,

    #[arg(long, help = "Exit successfully when no inference is found.")]
    pub allow_empty: bool,
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_param_mode() {
        let args = PostProcessArgs::try_parse_from(["gdlpost", "-p", "config.yaml", "-v"]).unwrap();
        assert_eq!(args.param, Some(PathBuf::from("config.yaml")));
        assert!(args.input.is_none());
        assert!(args.verbose);
    }

    #[test]
    fn test_input_mode() {
        let args = PostProcessArgs::try_parse_from(["gdlpost", "-i", "model.pth", "images.csv"]).unwrap();
        assert_eq!(
            args.input,
            Some(vec![PathBuf::from("model.pth"), PathBuf::from("images.csv")])
        );

        let args = PostProcessArgs::try_parse_from(["gdlpost", "--input", "model.pth", "-t", "2"]).unwrap();
        assert_eq!(args.input, Some(vec![PathBuf::from("model.pth")]));
        assert_eq!(args.threads, Some(2));
    }

    #[test]
    fn test_exactly_one_mode() {
        assert!(PostProcessArgs::try_parse_from(["gdlpost"]).is_err());
        assert!(
            PostProcessArgs::try_parse_from(["gdlpost", "-p", "config.yaml", "-i", "model.pth"])
                .is_err()
        );
    }
}

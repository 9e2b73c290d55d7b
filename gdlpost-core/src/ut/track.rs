// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use chrono;
use colored::*;
use kdam::{Bar, tqdm};

/// A basic progress bar for tracking processed inferences
pub fn progress_bar(n: usize, desc: &str, verbose: bool) -> Bar {
    if !verbose {
        return tqdm!(disable = true);
    }

    tqdm!(
        total = n,
        force_refresh = false,
        desc = progress_timestamp(desc),
        bar_format = "{desc suffix=' '}[{percentage:.0}%] ({rate:.1}/s, eta: {remaining human=true})"
    )
}

/// A standardized timestamp prefix for console output
pub fn progress_timestamp(desc: &str) -> String {
    let time = chrono::Local::now();
    let ymd = time.format("%Y-%m-%d").to_string();
    let hms = time.format("%H:%M:%S").to_string();
    let time = format!("{} | {}", ymd, hms);

    format!(
        "{} {} {} {} {} {}",
        "[".bold(),
        time,
        "|".bold(),
        "gdlpost".truecolor(69, 140, 194).bold(),
        "]".bold(),
        desc,
    )
}

/// Print timestamped statements to console
pub fn progress_log(desc: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("{}", progress_timestamp(desc));
}

/// Print a timestamped warning to stderr regardless of verbosity
pub fn progress_warn(desc: &str) {
    eprintln!(
        "{}",
        progress_timestamp(&format!("{} {}", "WARNING:".yellow().bold(), desc))
    );
}

/// Format numbers to readable thousands format
pub fn thousands_format<T>(number: T) -> String
where
    T: std::fmt::Display,
{
    let number = number.to_string();
    if number.len() > 4 {
        number
            .as_bytes()
            .rchunks(3)
            .rev()
            .map(std::str::from_utf8)
            .collect::<Result<Vec<&str>, _>>()
            .map(|chunks| chunks.join(","))
            .unwrap_or(number.clone())
    } else {
        number
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_thousands_format() {
        assert_eq!(thousands_format(12), "12");
        assert_eq!(thousands_format(1234), "1234");
        assert_eq!(thousands_format(12345), "12,345");
        assert_eq!(thousands_format(1234567), "1,234,567");
    }

    #[test]
    fn test_progress_timestamp_contains_desc() {
        let stamp = progress_timestamp("Found 3 inferences");
        assert!(stamp.contains("Found 3 inferences"));
        assert!(stamp.contains("gdlpost"));
    }
}

//! Command-line argument definitions for the PlotNet CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, whether the document
//! is compiled and opened, configuration file selection, and logging verbosity.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Command-line arguments for the PlotNet diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input architecture file (TOML)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output TeX file. Defaults to the input path with a `.tex` extension
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compile the TeX file to PDF with the configured compiler
    #[arg(long)]
    pub compile: bool,

    /// Keep the compiler's transient build files
    #[arg(long, requires = "compile")]
    pub keep_temp: bool,

    /// Open the compiled PDF in a viewer
    #[arg(long, requires = "compile")]
    pub open: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace). `PLOTNET_LOG` may
    /// refine it per module
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

impl Args {
    /// Returns where the TeX document is written.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(output) => PathBuf::from(output),
            None => PathBuf::from(&self.input).with_extension("tex"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_defaults_next_to_input() {
        let args = Args::parse_from(["plotnet", "demos/alexnet.toml"]);
        assert_eq!(args.output_path(), PathBuf::from("demos/alexnet.tex"));
        assert!(!args.compile);
        assert_eq!(args.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_explicit_output() {
        let args = Args::parse_from(["plotnet", "net.toml", "-o", "build/net.tex", "--compile"]);
        assert_eq!(args.output_path(), PathBuf::from("build/net.tex"));
        assert!(args.compile);
    }

    #[test]
    fn test_log_level_is_checked() {
        let args = Args::parse_from(["plotnet", "net.toml", "--log-level", "trace"]);
        assert_eq!(args.log_level, LevelFilter::Trace);
        assert!(Args::try_parse_from(["plotnet", "net.toml", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn test_open_requires_compile() {
        assert!(Args::try_parse_from(["plotnet", "net.toml", "--open"]).is_err());
        assert!(
            Args::try_parse_from(["plotnet", "net.toml", "--compile", "--open", "--keep-temp"])
                .is_ok()
        );
    }
}

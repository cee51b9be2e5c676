//! CLI argument parsing for isocore

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for replay reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable metrics table on stderr (default)
    Text,
    /// JSON report on stdout
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "isocore")]
#[command(version)]
#[command(about = "Isomorphic provenance mapping engine for syscall trace events", long_about = None)]
pub struct Cli {
    /// JSON-lines trace log to replay (stdin if omitted or "-")
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Engine configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip malformed records instead of aborting
    #[arg(long = "skip-invalid")]
    pub skip_invalid: bool,

    /// Number of mapped records to include in the report (0 = all)
    #[arg(long = "preview-limit", value_name = "N")]
    pub preview_limit: Option<usize>,

    /// Show percentile latency statistics
    #[arg(long = "stats-extended")]
    pub stats_extended: bool,

    /// Enable debug tracing output on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Input path, or `None` for stdin
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.as_os_str() != "-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["isocore"]);
        assert!(cli.input.is_none());
        assert!(cli.input_path().is_none());
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.config.is_none());
        assert!(!cli.skip_invalid);
        assert!(cli.preview_limit.is_none());
        assert!(!cli.stats_extended);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_parses_input() {
        let cli = Cli::parse_from(["isocore", "trace.jsonl"]);
        assert_eq!(cli.input_path(), Some(&PathBuf::from("trace.jsonl")));
    }

    #[test]
    fn test_cli_dash_means_stdin() {
        let cli = Cli::parse_from(["isocore", "-"]);
        assert!(cli.input.is_some());
        assert!(cli.input_path().is_none());
    }

    #[test]
    fn test_cli_json_format() {
        let cli = Cli::parse_from(["isocore", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_invalid_format() {
        assert!(Cli::try_parse_from(["isocore", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "isocore",
            "-c",
            "isocore.toml",
            "--skip-invalid",
            "--preview-limit",
            "10",
            "--stats-extended",
            "--debug",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("isocore.toml")));
        assert!(cli.skip_invalid);
        assert_eq!(cli.preview_limit, Some(10));
        assert!(cli.stats_extended);
        assert!(cli.debug);
    }
}

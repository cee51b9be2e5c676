use anyhow::{Context, Result};
use clap::Parser;
use isocore::cli::{Cli, OutputFormat};
use isocore::config::EngineConfig;
use isocore::json_output::JsonOutput;
use isocore::{replay, text_output};
use std::fs::File;
use std::io::{self, BufReader};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Load the config file (if any) and apply command-line overrides
fn build_config(args: &Cli) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    if args.skip_invalid {
        config.skip_invalid = true;
    }
    if let Some(limit) = args.preview_limit {
        config.preview_limit = limit;
    }
    if args.stats_extended {
        config.stats_extended = true;
    }

    config.validate()?;
    Ok(config)
}

fn run_replay(args: &Cli, config: &EngineConfig) -> Result<replay::ReplayReport> {
    match args.input_path() {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open trace log {}", path.display()))?;
            replay::replay(BufReader::new(file), config)
        }
        None => replay::replay(io::stdin().lock(), config),
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = build_config(&args)?;
    tracing::debug!(?config, "engine configuration");

    let report = run_replay(&args, &config)?;

    match args.format {
        OutputFormat::Text => eprint!("{}", text_output::format_summary(&report)),
        OutputFormat::Json => println!("{}", JsonOutput::from_report(&report).to_json()?),
    }

    Ok(())
}

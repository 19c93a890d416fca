//! Gator main entry point
//!
//! This is the command-line interface for the gator feed aggregator.

use anyhow::Context;
use clap::Parser;
use gator::commands::{default_registry, State};
use gator::config::{load_config, DEFAULT_CONFIG_FILE};
use gator::storage::open_storage;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Gator: a command-line RSS feed aggregator
///
/// Register a user, add and follow feeds, then run `agg <period>` to collect
/// posts from them and `browse` to read what was collected.
#[derive(Parser, Debug)]
#[command(name = "gator")]
#[command(version)]
#[command(about = "A command-line RSS feed aggregator", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Command to run (register, login, reset, users, agg, addfeed, feeds,
    /// follow, following, unfollow, browse)
    #[arg(value_name = "COMMAND")]
    command: String,

    /// Arguments passed to the command
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error running command {}: {:#}", cli.command, e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut state = open_state(&cli.config)?;
    default_registry()
        .run(&mut state, &cli.command, &cli.args)
        .await?;
    Ok(())
}

/// Loads the configuration and opens the database it points at
fn open_state(config_path: &Path) -> anyhow::Result<State> {
    tracing::debug!("Loading configuration from: {}", config_path.display());
    let config = load_config(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;

    let storage = open_storage(Path::new(&config.database_path))
        .with_context(|| format!("failed to open database {}", config.database_path))?;

    Ok(State::new(config, config_path.to_path_buf(), storage))
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gator=info,warn"),
            1 => EnvFilter::new("gator=debug,info"),
            2 => EnvFilter::new("gator=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

//! cli
//!
//! Command-line interface layer for msm.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and initialise logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Tool requests are handed to [`crate::tools`],
//! which is the only path into the catalog. Logs go to stderr so stdout
//! carries nothing but command output.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::ui::output::Verbosity;
use args::Command;

/// Settings shared by every command handler.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration
    pub config: Config,
    /// Output verbosity from `--quiet` / `--debug`
    pub verbosity: Verbosity,
    /// Directory searched for the project config
    pub project_dir: PathBuf,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    // Completion needs neither config nor logging.
    if let Command::Completion { shell } = cli.command {
        return commands::completion(shell);
    }

    let project_dir = match &cli.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to determine working directory")?,
    };
    let config = Config::load(cli.config.as_deref(), Some(&project_dir))
        .context("Failed to load configuration")?
        .config;
    init_logging(config.log_level(), cli.debug);

    let ctx = Context {
        config,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
        project_dir,
    };
    commands::dispatch(cli.command, &ctx)
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `--debug` forces `debug`; otherwise `RUST_LOG` wins over the configured
/// level.
fn init_logging(level: &str, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

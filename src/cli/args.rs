//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this global config file
//! - `--cwd <path>`: Look for `.msm/config.toml` here instead of the working directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// msm - a categorized label forest and the snippets tagged by it
#[derive(Parser, Debug)]
#[command(name = "msm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global config file to use instead of the discovered one
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run as if msm was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute tool requests, one JSON object per line
    #[command(
        name = "run",
        long_about = "Execute tool requests against an in-process catalog.\n\n\
            Each non-blank input line is a JSON object {\"tool\": NAME, \"arguments\": {...}}. \
            Lines starting with '#' are comments. One envelope is written to stdout per \
            request, in order. All requests in one run share the same catalog.",
        after_help = "\
EXAMPLES:
    # Run a script file
    msm run setup.jsonl

    # Pipe requests on stdin and check the forest afterwards
    echo '{\"tool\": \"ping\"}' | msm run --verify"
    )]
    Run {
        /// Script to read requests from (stdin if omitted)
        script: Option<PathBuf>,

        /// Check the forest invariants after the last request
        #[arg(long)]
        verify: bool,

        /// Stop at the first failed request
        #[arg(long)]
        fail_fast: bool,
    },

    /// List every tool with a short description
    Tools,

    /// Show or initialise configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Configuration actions.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration with defaults applied
    Show,
    /// Print which config files were loaded
    Path,
    /// Write a global config file holding the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags() {
        let cli = Cli::try_parse_from(["msm", "run", "script.jsonl", "--verify"]).unwrap();
        match cli.command {
            Command::Run {
                script,
                verify,
                fail_fast,
            } => {
                assert_eq!(script, Some(PathBuf::from("script.jsonl")));
                assert!(verify);
                assert!(!fail_fast);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["msm", "tools", "--quiet", "--config", "x.toml"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}

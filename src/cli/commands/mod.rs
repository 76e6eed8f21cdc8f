//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls into the catalog through [`crate::tools`], or reads config
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! The catalog is async. `run` builds a tokio runtime and blocks on it, so
//! the rest of the CLI stays synchronous.

mod completion;
mod config_cmd;
mod run;
mod tools_cmd;

pub use completion::completion;
pub use config_cmd::{init as config_init, path as config_path, show as config_show};
pub use run::{run, Request};
pub use tools_cmd::tools;

use super::args::{Command, ConfigAction};
use super::Context;
use anyhow::Result;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Run {
            script,
            verify,
            fail_fast,
        } => run(ctx, script.as_deref(), verify, fail_fast),
        Command::Tools => tools(ctx),
        Command::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => config_show(ctx),
            ConfigAction::Path => config_path(ctx),
            ConfigAction::Init { force } => config_init(ctx, force),
        },
        Command::Completion { shell } => completion(shell),
    }
}

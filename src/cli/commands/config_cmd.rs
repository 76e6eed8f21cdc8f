//! config command - Show or initialise configuration

use crate::cli::Context;
use crate::core::config::{Config, FileConfig, LoggingConfig, PoolConfig, TreeConfig};
use crate::core::types::MaxDepth;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

/// Print the effective configuration as TOML, defaults filled in.
pub fn show(ctx: &Context) -> Result<()> {
    let resolved = resolved(&ctx.config);
    let text = toml::to_string_pretty(&resolved).context("Failed to render configuration")?;
    // Printed even with --quiet: the output is the point of the command.
    print!("{}", text);
    Ok(())
}

/// Print the config files that were loaded.
pub fn path(ctx: &Context) -> Result<()> {
    let describe = |p: Option<&std::path::Path>| {
        p.map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    };
    println!("global:  {}", describe(ctx.config.global_config_loaded_from()));
    println!("project: {}", describe(ctx.config.project_config_loaded_from()));
    Ok(())
}

/// Write the defaults to the canonical global config path.
pub fn init(ctx: &Context, force: bool) -> Result<()> {
    let path = Config::global_config_path().context("Failed to locate global config")?;
    if path.exists() && !force {
        bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    let written = Config::write_global(&resolved(&Config::default()))
        .context("Failed to write global config")?;
    output::status(format!("Wrote {}", written.display()), ctx.verbosity);
    Ok(())
}

/// Every setting with its effective value.
fn resolved(config: &Config) -> FileConfig {
    let default_max_depth = match config.default_max_depth() {
        MaxDepth::Unbounded => None,
        MaxDepth::Limited(depth) => Some(depth),
    };
    FileConfig {
        pool: Some(PoolConfig {
            max_connections: Some(config.max_connections()),
            acquisition_timeout_ms: Some(config.acquisition_timeout().as_millis() as u64),
        }),
        logging: Some(LoggingConfig {
            level: Some(config.log_level().to_string()),
        }),
        tree: Some(TreeConfig { default_max_depth }),
    }
}

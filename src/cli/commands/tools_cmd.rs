//! tools command - List every tool

use crate::cli::Context;
use crate::tools::ToolName;
use crate::ui::output;
use anyhow::Result;

/// Print each tool name with its one-line summary.
pub fn tools(ctx: &Context) -> Result<()> {
    let rows: Vec<(&str, &str)> = ToolName::ALL
        .iter()
        .map(|tool| (tool.as_str(), tool.summary()))
        .collect();
    output::print(output::format_table(&rows), ctx.verbosity);
    Ok(())
}

//! The `tags` command: render the static tag-definition table.
//!
//! The same table drives the parser, so this listing can never drift
//! from what documents may actually use.

use anyhow::Result;
use colored::Colorize;
use docci_core::TAG_SPECS;

use crate::cli::OutputFormat;

/// Execute `docci tags`.
pub fn execute(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(TAG_SPECS)?);
        },
        OutputFormat::Text => {
            println!("{}", "Supported tags:".bold());
            for spec in TAG_SPECS {
                println!();
                println!("  {} ({})", spec.name.cyan().bold(), spec.kind.describe());
                if !spec.aliases.is_empty() {
                    println!("    aliases: {}", spec.aliases.join(", "));
                }
                println!("    {}", spec.description);
            }
        },
    }
    Ok(())
}

//! The `validate` command: parse documents without executing anything.
//!
//! Prints a per-document block summary on success and exits non-zero on
//! the first parse error, making it cheap to gate documentation changes
//! in CI before anything runs.

use anyhow::Result;
use colored::Colorize;
use docci_core::{Block, LogSink, RunOptions, Runner};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::utils::split_input_paths;

#[derive(Debug, Serialize)]
struct BlockSummary<'a> {
    index: usize,
    language: &'a str,
    line: usize,
    source: Option<&'a str>,
    background: bool,
    file_operation: bool,
}

impl<'a> BlockSummary<'a> {
    fn from_block(block: &'a Block) -> Self {
        Self {
            index: block.index,
            language: &block.language,
            line: block.line_number,
            source: block.source_file.as_deref(),
            background: block.is_background(),
            file_operation: block.is_file_operation(),
        }
    }
}

/// Execute `docci validate`.
pub fn execute(paths_arg: &str, format: OutputFormat, log: LogSink) -> Result<()> {
    let paths = split_input_paths(paths_arg);
    if paths.is_empty() {
        anyhow::bail!("no input documents given");
    }

    let runner = Runner::new(RunOptions::default(), log);
    let blocks = match runner.parse_documents(&paths) {
        Ok(blocks) => blocks,
        Err(err) => {
            eprintln!("{} {err}", "invalid:".red().bold());
            std::process::exit(1);
        },
    };

    match format {
        OutputFormat::Json => {
            let summaries: Vec<BlockSummary<'_>> =
                blocks.iter().map(BlockSummary::from_block).collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        },
        OutputFormat::Text => {
            println!(
                "{} {} runnable block(s) across {} document(s)",
                "valid:".green().bold(),
                blocks.len(),
                paths.len()
            );
            for block in &blocks {
                let source = block.source_file.as_deref().unwrap_or("<input>");
                let mut notes = Vec::new();
                if block.is_background() {
                    notes.push("background");
                }
                if block.is_file_operation() {
                    notes.push("file-op");
                }
                let suffix = if notes.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", notes.join(", "))
                };
                println!(
                    "  {:>3}. {}:{} ({}){suffix}",
                    block.index,
                    source,
                    block.line_number,
                    if block.language.is_empty() {
                        "plain"
                    } else {
                        block.language.as_str()
                    }
                );
            }
        },
    }
    Ok(())
}

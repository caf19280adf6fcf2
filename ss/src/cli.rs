//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::{Region, ShoppingList};

/// SmartShopper - price search and shopping plans for South African retailers
#[derive(Parser)]
#[command(
    name = "ss",
    about = "Find the best grocery deals across South African retailers",
    version = env!("CARGO_PKG_VERSION"),
    after_help = after_help(),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute; none starts the interactive UI
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the pipeline once and print the report
    Run {
        /// Items to price
        #[arg(value_name = "ITEM")]
        items: Vec<String>,

        /// Read items from a file, one per line (# starts a comment)
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Region label for the report header
        #[arg(short, long)]
        region: Option<Region>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List the selectable regions
    Regions,

    /// List the agents and what they can call
    Agents,
}

/// Report output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smartshopper")
        .join("logs")
        .join("smartshopper.log")
}

fn after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}

/// Parse item lines: trimmed, blank lines and `#` comments skipped
pub fn parse_item_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Build the shopping list from positional items then the `--file` contents
pub fn collect_items(items: &[String], file: Option<&Path>) -> Result<ShoppingList> {
    debug!(count = items.len(), ?file, "collect_items: called");
    let mut list: ShoppingList = items.iter().collect();
    if let Some(path) = file {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read item file {}", path.display()))?;
        for item in parse_item_lines(&content) {
            list = list.add(&item);
        }
    }
    Ok(list)
}

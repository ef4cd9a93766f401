//! CLI definitions for commitgrab.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// commitgrab CLI.
#[derive(Parser)]
#[command(name = "commitgrab")]
#[command(about = "Capture merge request commit lists from a debuggable browser tab")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.commitgrab/config.toml)
    #[arg(short, long, global = true, env = "COMMITGRAB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Reload a tab and capture its commit list
    Capture {
        /// Tab to capture (default: the first page tab)
        #[arg(long)]
        tab: Option<String>,

        /// Remote debugging endpoint, overrides the config
        #[arg(long)]
        endpoint: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Capture budget in milliseconds, overrides the config
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// List debuggable tabs
    Tabs {
        /// Remote debugging endpoint, overrides the config
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Parse a saved commits.json response offline
    Parse {
        /// Path to the saved response body
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Configuration and pattern management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show the effective configuration and stored patterns
    Show,

    /// Store a new ticket pattern, e.g. '/[A-Z]+-\d+/'
    SetTicketRegex { pattern: String },

    /// Store a new clean pattern, e.g. '/^fix:\s*/i'
    SetCleanRegex { pattern: String },

    /// Restore the default patterns
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Clipboard-ready text
    Text,
    /// The raw result payload
    Json,
}

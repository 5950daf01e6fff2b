//! CLI module for mediaflow.

pub mod commands;
mod output;
mod params;

pub use output::Output;
pub use params::parse_params;

use clap::{Parser, Subcommand};

/// mediaflow - supervised media tools
///
/// Runs clip selection, audio processing and post scheduling under retry,
/// quality degradation and health tracking.
#[derive(Parser, Debug)]
#[command(name = "mediaflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "MEDIAFLOW_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered tools and workflows
    Tools {
        /// Print full parameter schemas as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a single tool
    Run {
        /// Tool name
        tool: String,

        /// Parameter as key=value (value parsed as JSON when possible)
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Plan without side effects
        #[arg(long)]
        dry_run: bool,

        /// Starting quality tier (high, medium, low, minimal)
        #[arg(short, long)]
        quality: Option<String>,
    },

    /// Run a workflow
    Workflow {
        /// Workflow name
        name: String,

        /// Initial parameter as key=value (value parsed as JSON when possible)
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Plan without side effects
        #[arg(long)]
        dry_run: bool,

        /// Starting quality tier (high, medium, low, minimal)
        #[arg(short, long)]
        quality: Option<String>,
    },

    /// Select clips from a transcript and print or write the EDL
    Clips {
        /// Transcript JSON file (array of segments or {"segments": [...]})
        transcript: String,

        /// Write the EDL to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Minimum clip duration in seconds
        #[arg(long)]
        min_duration: Option<f64>,

        /// Maximum clip duration in seconds
        #[arg(long)]
        max_duration: Option<f64>,

        /// Maximum number of clips
        #[arg(short = 'n', long)]
        max_clips: Option<usize>,

        /// Minimum clip score
        #[arg(long)]
        min_score: Option<f64>,
    },

    /// Show resource usage and health classification
    Health,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

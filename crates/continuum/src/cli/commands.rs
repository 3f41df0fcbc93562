//! CLI command definitions.

use clap::{Parser, Subcommand};
use continuum::LogFormat;
use std::path::PathBuf;

/// Continuum - deterministic continuity for AI video prompts
#[derive(Parser, Debug)]
#[command(name = "continuum")]
#[command(about = "Deterministic continuity engine and batch orchestrator for AI video prompts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format (pretty or json)
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Export tracing spans to stdout
    #[arg(long, global = true)]
    pub export_spans: bool,

    /// Configuration file layered over the bundled defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the continuity refs of every segment in a segment file
    Continuity {
        /// JSON array of segments
        #[arg(long)]
        segments: PathBuf,

        /// JSON array of asset records used for character profiles
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Continue from the persisted state of this story
        #[arg(long)]
        story: Option<String>,

        /// Save the resulting state for the story
        #[arg(long, requires = "story")]
        persist: bool,
    },

    /// Compress a prompt to a word budget
    Compress {
        /// Prompt text
        prompt: String,

        /// Word budget; defaults to the configured target
        #[arg(long)]
        target: Option<usize>,
    },

    /// Find the candidate most similar to a text
    Similarity {
        /// Text to check
        text: String,

        /// Candidate texts, in order
        #[arg(long = "candidate")]
        candidates: Vec<String>,
    },

    /// Generate a story against canned backend replies
    Generate {
        /// JSON story request
        #[arg(long)]
        request: PathBuf,

        /// Directory holding batch_<n>.json replies
        #[arg(long)]
        replay_dir: PathBuf,
    },
}

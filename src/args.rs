use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::chat::{DEFAULT_API_BASE, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::gaps::{GapConfig, DEFAULT_GAP_THRESHOLD, DEFAULT_MIN_VOLUME, DEFAULT_TOP_N};

pub const DEFAULT_QUESTION: &str = "What prompts are we missing out on and what content recs can you make so we can better capitalize in that space?";

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Rule-based heuristics, no network access
    Rules,
    /// Delegate the write-up to a chat-completion model
    Llm,
}

#[derive(Parser, Debug)]
#[command(
    name = "gapsight",
    about = "Find keyword gaps in a ranking export and turn them into content recommendations",
    version,
    long_about = None
)]
pub struct Args {
    /// CSV export with keyword, volume and position columns
    pub input: PathBuf,

    /// Question the report should answer
    #[arg(short, long, default_value = DEFAULT_QUESTION)]
    pub question: String,

    /// Minimum monthly search volume for a gap
    #[arg(long, default_value_t = DEFAULT_MIN_VOLUME)]
    pub min_volume: u64,

    /// Treat a keyword as a gap when its position is greater than this
    #[arg(long, default_value_t = DEFAULT_GAP_THRESHOLD)]
    pub gap_threshold: u32,

    /// Number of top gaps to keep
    #[arg(short, long, default_value_t = DEFAULT_TOP_N)]
    pub top: usize,

    /// How the report is written
    #[arg(short, long, value_enum, default_value_t = Mode::Rules)]
    pub mode: Mode,

    /// API key for the chat-completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model identifier sent to the endpoint
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Retries for transient endpoint failures
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub retries: u32,

    /// Print the gap table before the report
    #[arg(long)]
    pub evidence: bool,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn gap_config(&self) -> GapConfig {
        GapConfig {
            min_volume: self.min_volume,
            gap_threshold: self.gap_threshold,
            top_n: self.top,
        }
    }
}

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::page::wait::Timing;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "formfill",
    version,
    about = "Form field discovery and fill-back engine for interactive pages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Ollama API endpoint
    #[arg(long, global = true)]
    pub ollama_endpoint: Option<String>,

    /// Ollama model name
    #[arg(long, global = true)]
    pub ollama_model: Option<String>,

    /// Path to the page host script
    #[arg(long, global = true)]
    pub host_script: Option<String>,

    /// Path to config file (default: formfill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Write a jsonl trace of the run
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a page and print its fillable fields as JSON
    Detect {
        /// URL of the page to scan
        #[arg(long)]
        url: String,

        /// Only report fields whose value is still empty
        #[arg(long, default_value_t = false)]
        empty_only: bool,
    },

    /// Fill a page from a prepared answers file
    Fill {
        /// URL of the page to fill
        #[arg(long)]
        url: String,

        /// JSON file mapping field ids to answers
        #[arg(long)]
        answers: String,
    },

    /// Scan, answer, and fill in one run
    Apply {
        /// URL of the page to process
        #[arg(long)]
        url: String,

        /// JSON profile file the answers are drawn from
        #[arg(long)]
        profile: String,

        /// Plain-text posting or context file handed to the model
        #[arg(long)]
        job_text: Option<String>,

        /// Resume file uploaded before filling, if the page takes one
        #[arg(long)]
        resume: Option<String>,

        /// Answer provider: heuristic or llm
        #[arg(long, default_value = "heuristic")]
        provider: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `formfill.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_host_script")]
    pub script: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            script: default_host_script(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,

    #[serde(default = "default_attempt_settle_ms")]
    pub attempt_settle_ms: u64,

    #[serde(default = "default_expand_budget_ms")]
    pub expand_budget_ms: u64,

    #[serde(default = "default_option_wait_ms")]
    pub option_wait_ms: u64,

    #[serde(default = "default_settle_max_wait_ms")]
    pub settle_max_wait_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_ms: 40,
            attempt_settle_ms: 80,
            expand_budget_ms: 600,
            option_wait_ms: 400,
            settle_max_wait_ms: 8000,
        }
    }
}

impl TimingConfig {
    pub fn to_timing(&self) -> Timing {
        Timing {
            poll_ms: self.poll_ms,
            attempt_settle_ms: self.attempt_settle_ms,
            expand_budget_ms: self.expand_budget_ms,
            option_wait_ms: self.option_wait_ms,
            settle_max_wait_ms: self.settle_max_wait_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OllamaConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

// Serde default helpers
fn default_host_script() -> String { "scripts/page_host.js".to_string() }
fn default_poll_ms() -> u64 { 40 }
fn default_attempt_settle_ms() -> u64 { 80 }
fn default_expand_budget_ms() -> u64 { 600 }
fn default_option_wait_ms() -> u64 { 400 }
fn default_settle_max_wait_ms() -> u64 { 8000 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("formfill.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

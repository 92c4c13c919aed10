//! CLI surface for agentic-eda.

pub mod errors;
pub mod menu;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::EdaConfig;

/// Agentic exploratory data analysis in a remote sandbox
#[derive(Parser, Debug)]
#[command(name = "agentic-eda", version, about = "Agentic exploratory data analysis in a remote sandbox")]
pub struct Cli {
    /// Config file (default: platform config dir `agentic-eda/config.toml`)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model that drives the analysis
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Ceiling on model requests per user message
    #[arg(long, global = true)]
    pub max_tool_calls: Option<usize>,

    /// Directory for saved plot images
    #[arg(long, global = true)]
    pub image_dir: Option<PathBuf>,

    /// Log lifecycle events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Without a subcommand the interactive menu starts.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a session on local dataset files
    Analyze(AnalyzeArgs),
    /// Download a dataset with the browser agent, then start a session
    Download(DownloadArgs),
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Dataset files to upload
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Send these messages in order instead of reading the terminal
    #[arg(long = "ask")]
    pub ask: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Instructions for the browser agent (default: the SuperstoreData sample)
    pub task: Option<String>,
}

impl Cli {
    /// Apply command-line flags on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut EdaConfig) {
        if let Some(model) = &self.model {
            config.eda_model = model.clone();
        }
        if let Some(max) = self.max_tool_calls {
            config.max_consecutive_tool_calls = max;
        }
        if let Some(dir) = &self.image_dir {
            config.image_dir = dir.clone();
        }
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod analyze;
mod check;
mod extract;
mod helpers;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::models::Operation;
use crate::services::DocumentAnalyzer;

#[derive(Parser)]
#[command(name = "doclens")]
#[command(about = "Document extraction and text analysis")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "DOCLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Where analysis input comes from.
#[derive(Args, Debug, Clone)]
pub(crate) struct InputArgs {
    /// Text to analyze
    text: Option<String>,

    /// Analyze the text extracted from a document instead
    #[arg(short, long, conflicts_with_all = ["text", "stdin"])]
    file: Option<PathBuf>,

    /// Document kind for --file (pdf, word, spreadsheet, presentation, image)
    #[arg(short, long, requires = "file")]
    kind: Option<String>,

    /// Read text from stdin
    #[arg(long, conflicts_with = "text")]
    stdin: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text and metadata from a document
    Extract {
        /// Document to extract
        file: PathBuf,
        /// Document kind (detected from the file when omitted)
        #[arg(short, long)]
        kind: Option<String>,
        /// Include full spreadsheet cell grids
        #[arg(long)]
        full: bool,
    },

    /// Classify the sentiment of text or a document
    Sentiment {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Summarize text or a document
    Summary {
        #[command(flatten)]
        input: InputArgs,
        /// Maximum summary length in words
        #[arg(long)]
        max_length: Option<usize>,
        /// Minimum summary length in words (shorter input is returned as-is)
        #[arg(long)]
        min_length: Option<usize>,
    },

    /// List the most frequent keywords in text or a document
    Keywords {
        #[command(flatten)]
        input: InputArgs,
        /// Number of keywords to return
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },

    /// Check extraction tools and analysis backends
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };
    if let Some(path) = &config.source_path {
        tracing::info!("Loaded config from {}", path.display());
    }

    let analyzer = Arc::new(DocumentAnalyzer::from_config(&config));

    let result = match cli.command {
        Commands::Extract { file, kind, full } => {
            extract::cmd_extract(&analyzer, file, kind.as_deref(), full, cli.json).await
        }
        Commands::Sentiment { input } => {
            let params = analyze::params_for(Operation::Sentiment, &config, None, None, None);
            analyze::cmd_analyze(&analyzer, input, params, cli.json).await
        }
        Commands::Summary {
            input,
            max_length,
            min_length,
        } => {
            let params =
                analyze::params_for(Operation::Summary, &config, max_length, min_length, None);
            analyze::cmd_analyze(&analyzer, input, params, cli.json).await
        }
        Commands::Keywords { input, top_n } => {
            let params = analyze::params_for(Operation::Keywords, &config, None, None, top_n);
            analyze::cmd_analyze(&analyzer, input, params, cli.json).await
        }
        Commands::Check => check::cmd_check(&analyzer, &config, cli.json).await,
    };

    analyzer.shutdown();
    result
}

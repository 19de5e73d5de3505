//! # AI Detector CLI (`ai-detector`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ai-detector serve` | Start the HTTP analysis server |
//! | `ai-detector score <TEXT>...` | Print a verdict for each sentence |
//! | `ai-detector analyze [FILE]` | Highlight a document (file or stdin) |
//!
//! ## Examples
//!
//! ```bash
//! # Start the server on the configured bind address
//! ai-detector serve --config ./config/detector.toml
//!
//! # Score a few sentences with an explicit model
//! ai-detector score "The cat sat." "We delve into the tapestry." --model ./models/m.json
//!
//! # Re-analyze an edited essay, reusing the previous run's scores
//! ai-detector analyze essay.txt --json --cache previous.json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ai_detector::analyze_cmd::{self, AnalyzeOptions};
use ai_detector::config::{self, Config};
use ai_detector::{logging, score_cmd, server};

/// Sentence-level AI text detector.
///
/// `serve` requires a config file. `score` and `analyze` fall back to
/// built-in defaults when the config file is missing.
#[derive(Parser)]
#[command(
    name = "ai-detector",
    about = "Sentence-level AI text detection with incremental highlighting",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/detector.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP analysis server.
    ///
    /// Loads the model, then binds to `[server].bind`. Fails without
    /// listening if the model cannot be loaded.
    Serve,

    /// Classify each argument as a standalone sentence.
    ///
    /// Prints one `Label  (p= 0.xx)` line per argument.
    Score {
        /// Sentences to classify.
        #[arg(required = true)]
        texts: Vec<String>,

        /// Model artifact; overrides `[model].path`.
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Highlight a document and print the HTML.
    Analyze {
        /// Input file. Reads stdin when omitted.
        file: Option<PathBuf>,

        /// Print `{"html", "results"}` JSON instead of bare HTML.
        #[arg(long)]
        json: bool,

        /// A `results` object from an earlier run to reuse.
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Model artifact; overrides `[model].path`.
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Serve needs a real config; the offline commands can use defaults.
    let mut cfg = match &cli.command {
        Commands::Serve => config::load_config(&cli.config)?,
        _ => config::load_config(&cli.config).unwrap_or_else(|_| Config::minimal()),
    };

    logging::init(&cfg.logging.filter);

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Score { texts, model } => {
            let model_path = model.unwrap_or(cfg.model.path);
            score_cmd::run_score(&model_path, &texts).await?;
        }
        Commands::Analyze {
            file,
            json,
            cache,
            model,
        } => {
            if let Some(path) = model {
                cfg.model.path = path;
            }
            analyze_cmd::run_analyze(&cfg, &AnalyzeOptions { file, json, cache }).await?;
        }
    }

    Ok(())
}

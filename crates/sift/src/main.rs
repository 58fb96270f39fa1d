//! Sift CLI - fast supervised text classification.
//!
//! Sift loads a trained text classifier and labels text line by line,
//! evaluates it against labeled test files, and inspects model artifacts.
//!
//! # Usage
//!
//! ```bash
//! # Top label for every line of a file
//! sift predict news.bin articles.txt
//!
//! # Top 3 labels with probabilities, reading stdin
//! cat articles.txt | sift predict news -k 3 --prob
//!
//! # Precision and recall at 1
//! sift test news.bin news.test
//!
//! # View configuration
//! sift config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Sift - fast supervised text classification.
#[derive(Parser, Debug)]
#[command(name = "sift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "SIFT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Predict labels for each line of text
    Predict(cli::predict::PredictArgs),

    /// Evaluate a model on a labeled test file
    Test(cli::test::TestArgs),

    /// Show model hyperparameters and vocabulary
    Info(cli::info::InfoArgs),

    /// Print sentence or word vectors
    Vectors(cli::vectors::VectorsArgs),

    /// Manage model artifacts (list, verify, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match &cli.config {
        Some(path) => sift_core::Config::load_from(path)?,
        None => match sift_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `sift config path`."
                );
                sift_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Sift v{}", sift_core::VERSION);

    match cli.command {
        Commands::Predict(args) => cli::predict::execute(args, &config),
        Commands::Test(args) => cli::test::execute(args, &config),
        Commands::Info(args) => cli::info::execute(args, &config),
        Commands::Vectors(args) => cli::vectors::execute(args, &config),
        Commands::Models(args) => cli::models::execute(args, &config),
        Commands::Config(args) => cli::config::execute(args, &config, cli.config.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_predict() {
        let cli = Cli::try_parse_from(["sift", "-v", "predict", "news", "in.txt", "-k", "3"])
            .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Predict(args) => {
                assert_eq!(args.model, "news");
                assert_eq!(args.k, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

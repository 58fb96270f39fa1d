//! The `sift models` command for managing model artifacts.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use sift_core::{Config, Model};

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List model artifacts in the model directory
    List,

    /// Show model directory path
    Path,

    /// Fully load a model and print its BLAKE3 checksum
    Verify {
        /// Model file, or a model name in the model directory
        name: String,
    },
}

/// Execute the models command.
pub fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::List => {
            let model_dir = config.model_dir();
            let models = list_models(&model_dir)?;

            if models.is_empty() {
                println!("No models found in {}", model_dir.display());
                return Ok(());
            }

            println!("Installed models:");
            println!("  Directory: {}\n", model_dir.display());
            for (path, size) in &models {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("    - {:30} {:>10.1} MB", name, *size as f64 / (1024.0 * 1024.0));
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }

        ModelsCommand::Verify { name } => {
            let (path, model, checksum) = verify(&name, config)?;
            println!("{}: ok", path.display());
            println!("  blake3  {checksum}");
            println!(
                "  {} words, {} labels, dim {}, {}",
                model.words().len(),
                model.num_labels(),
                model.dimension(),
                model.args().loss
            );
        }
    }

    Ok(())
}

/// `.bin` files directly under `dir` with their sizes, sorted by path.
///
/// A missing directory lists as empty.
fn list_models(dir: &Path) -> anyhow::Result<Vec<(PathBuf, u64)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut models = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "bin") && path.is_file() {
            models.push((path, entry.metadata()?.len()));
        }
    }
    models.sort();
    Ok(models)
}

/// BLAKE3 hex digest of the whole file, streamed.
fn content_hash(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut reader, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Fully load `name`, which checks the embedded checksum and every shape,
/// then hash the file.
fn verify(name: &str, config: &Config) -> anyhow::Result<(PathBuf, Model, String)> {
    let path = config.resolve_model(name);
    let model = super::load_model(name, config)?;
    let checksum = content_hash(&path)?;
    Ok((path, model, checksum))
}

use clap::{Parser, Subcommand};
use eyre::{bail, Result};
use splsa::prelude::*;
use std::path::PathBuf;

/// Supervised probabilistic latent semantic analysis.
///
/// Learns topics from word counts while regressing a per-document outcome on the topic proportions.
#[derive(Parser)]
#[command(name = "splsa", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train and evaluate every combination of the sweep
    RunModel {
        /// Path to the TOML configuration file
        #[arg(long, default_value = "config.toml")]
        config: String,
    },

    /// Print the most probable words of every topic of a saved topic-word matrix
    Analyze {
        /// The saved topic-word matrix
        #[arg(long)]
        beta: PathBuf,

        /// The vocabulary file, one word per line
        #[arg(long)]
        vocabulary: Option<PathBuf>,

        /// The saved regression weights
        #[arg(long)]
        v: Option<PathBuf>,

        /// Number of words per topic (default: 40)
        #[arg(long, default_value = "40")]
        top: usize,
    },

    /// Delete the output folder
    Clean {
        /// Path to the TOML configuration file
        #[arg(long, default_value = "config.toml")]
        config: String,
    },

    /// Import raw documents
    Import,

    /// Extract text from imported documents
    Extract,

    /// Filter tokens and build the vocabulary
    Filter,

    /// Split documents into training, validation and test sets
    Partition,

    /// Write the word-count datasets
    PrepareDatasets,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::RunModel { config } => {
            let settings = settings::read(config)?;
            let log = run_model(settings)?;
            let failed = log.records().iter().filter(|r| r.is_failed()).count();
            println!(
                "Completed {} combinations, {} failed",
                log.records().len(),
                failed
            );
        }
        Commands::Analyze {
            beta,
            vocabulary,
            v,
            top,
        } => {
            let report = analyze(beta, v, vocabulary, top)?;
            print!("{}", report);
        }
        Commands::Clean { config } => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .with_target(false)
                .init();
            let settings = settings::load(config)?;
            clean(&settings)?;
        }
        Commands::Import
        | Commands::Extract
        | Commands::Filter
        | Commands::Partition
        | Commands::PrepareDatasets => {
            bail!("Corpus preparation is not part of splsa. Prepare the document and outcome files with a text processing tool, then use `run-model`.")
        }
    }

    Ok(())
}

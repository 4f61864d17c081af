//! gradebook CLI: consistency checks and summaries of saved gradebooks.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "gradebook",
    version,
    about = "Referentially consistent grading data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a gradebook and verify its links
    Check {
        /// Path to the gradebook JSON file
        #[arg(long)]
        data: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Exit code 1 if any score lies outside its category's bounds
        #[arg(long)]
        strict: bool,
    },

    /// Per-student and per-category totals
    Summary {
        /// Path to the gradebook JSON file
        #[arg(long)]
        data: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List registered evaluations
    Evaluations {
        /// Path to the gradebook JSON file
        #[arg(long)]
        data: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and sample gradebook
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gradebook=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            data,
            config,
            strict,
        } => commands::check::execute(data, config, strict),
        Commands::Summary {
            data,
            config,
            format,
        } => commands::summary::execute(data, config, format),
        Commands::Evaluations { data, config } => commands::evaluations::execute(data, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;
pub mod progress;

/// cvmatch - Rank résumés against job descriptions
#[derive(Parser, Debug)]
#[command(name = "cvm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit JSON on stdout for machine consumption
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/cvm/config.toml then <root>/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the database and embeddings
    #[arg(long, global = true, env = "CVM_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, database and default config
    Init(commands::init::InitArgs),

    /// Parse and store a single résumé
    Ingest(commands::ingest::IngestArgs),

    /// Ingest every résumé in a CSV file
    Batch(commands::batch::BatchArgs),

    /// Recompute embeddings for all candidates
    Precompute(commands::precompute::PrecomputeArgs),

    /// Rank candidates against a job description
    Match(commands::matching::MatchArgs),

    /// Show a candidate profile
    Show(commands::show::ShowArgs),

    /// Search candidates by name or skill
    Search(commands::search::SearchArgs),

    /// Show database and embedding statistics
    Stats(commands::stats::StatsArgs),

    /// Test the embedding backend
    Embed(commands::embed::EmbedArgs),

    /// Show the effective configuration
    Config(commands::config::ConfigArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

//! cvm init - Create the data directory, database and default config

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::{AppContext, CONFIG_FILENAME, DATABASE_FILENAME, EMBEDDINGS_DIR, resolve_root};
use crate::cli::Cli;
use crate::cli::output::{emit_robot, robot_ok};
use crate::config::Config;
use crate::error::Result;
use crate::storage::Database;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config.toml with defaults
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    root: PathBuf,
    database: PathBuf,
    embeddings: PathBuf,
    config: PathBuf,
    config_written: bool,
    schema_version: u32,
}

pub fn run(ctx: &AppContext, args: &InitArgs) -> Result<()> {
    report(&initialize(&ctx.root, args)?, ctx.robot_mode)
}

/// `init` must work before a root exists, so it skips [`AppContext`].
pub fn run_without_context(cli: &Cli, args: &InitArgs) -> Result<()> {
    let root = resolve_root(cli.root.as_deref())?;
    report(&initialize(&root, args)?, cli.robot)
}

fn initialize(root: &Path, args: &InitArgs) -> Result<InitReport> {
    fs::create_dir_all(root)?;

    let database = root.join(DATABASE_FILENAME);
    let db = Database::open(&database)?;

    let embeddings = root.join(EMBEDDINGS_DIR);
    fs::create_dir_all(&embeddings)?;

    let config = root.join(CONFIG_FILENAME);
    let config_written = args.force || !config.exists();
    if config_written {
        fs::write(&config, Config::default().to_toml()?)?;
    }

    Ok(InitReport {
        root: root.to_path_buf(),
        database,
        embeddings,
        config,
        config_written,
        schema_version: db.schema_version(),
    })
}

fn report(report: &InitReport, robot_mode: bool) -> Result<()> {
    if robot_mode {
        return emit_robot(&robot_ok(report));
    }

    println!("{} Initialized at {}", "✓".green().bold(), report.root.display());
    println!("  Database:   {}", report.database.display());
    println!("  Embeddings: {}", report.embeddings.display());
    if report.config_written {
        println!("  Config:     {}", report.config.display());
    } else {
        println!(
            "  Config:     {} {}",
            report.config.display(),
            "(kept; use --force to reset)".dimmed()
        );
    }
    println!();
    println!("Next: cvm ingest --file resume.txt  or  cvm batch resumes.csv");
    Ok(())
}

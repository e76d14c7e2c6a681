//! cvm batch - Ingest every résumé in a CSV file

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::commands::precompute::precompute_with_progress;
use crate::cli::output::{emit_robot, robot_ok, robot_partial};
use crate::cli::progress::ProgressReporter;
use crate::error::Result;
use crate::ingest::{BatchReport, CsvColumns, ingest_csv_with_progress};
use crate::storage::PrecomputeReport;

/// Row errors listed in human output before truncating.
const MAX_ERRORS_SHOWN: usize = 10;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// CSV file with one résumé per row
    pub csv: PathBuf,

    /// Column holding the résumé text [default: from config, Resume_str]
    #[arg(long)]
    pub resume_column: Option<String>,

    /// Column holding the category label [default: from config, Category]
    #[arg(long)]
    pub category_column: Option<String>,

    /// Column holding the source id, used to name unnamed candidates
    #[arg(long)]
    pub id_column: Option<String>,

    /// Skip the embedding pass after inserting rows
    #[arg(long)]
    pub no_precompute: bool,
}

#[derive(Debug, Serialize)]
struct BatchOutput {
    #[serde(flatten)]
    report: BatchReport,
    precompute: Option<PrecomputeReport>,
}

pub fn run(ctx: &AppContext, args: &BatchArgs) -> Result<()> {
    let columns = columns(ctx, args);
    let reporter = ProgressReporter::new(ctx.robot_mode, ctx.quiet);

    let rows = count_rows(&args.csv)?;
    let bar = reporter.progress(rows, "Ingesting résumés");
    let report = match ingest_csv_with_progress(&ctx.db, &args.csv, &columns, |row| {
        bar.set_position(row as u64);
    }) {
        Ok(report) => {
            bar.finish_with_message(&format!("{} rows read", report.total));
            report
        }
        Err(err) => {
            bar.abandon_with_message(&err.to_string());
            return Err(err);
        }
    };

    let precompute = if args.no_precompute || report.processed == 0 {
        None
    } else {
        Some(precompute_with_progress(ctx, &reporter)?)
    };

    let output = BatchOutput { report, precompute };
    if ctx.robot_mode {
        let (completed, failed) = (output.report.processed, output.report.skipped);
        if failed > 0 {
            return emit_robot(&robot_partial(&output, completed, failed));
        }
        return emit_robot(&robot_ok(&output));
    }

    print_human(&output);
    Ok(())
}

fn columns(ctx: &AppContext, args: &BatchArgs) -> CsvColumns {
    let mut columns = CsvColumns::from(&ctx.config.ingest);
    if let Some(name) = &args.resume_column {
        columns.resume.clone_from(name);
    }
    if let Some(name) = &args.category_column {
        columns.category.clone_from(name);
    }
    if let Some(name) = &args.id_column {
        columns.id.clone_from(name);
    }
    columns
}

/// Data rows in the file, for sizing the progress bar.
fn count_rows(path: &std::path::Path) -> Result<u64> {
    let mut reader = csv::Reader::from_path(path)?;
    Ok(reader.records().count() as u64)
}

fn print_human(output: &BatchOutput) {
    let report = &output.report;
    println!("{}", "Batch ingest".bold());
    println!("  Rows:      {}", report.total);
    println!("  Processed: {}", report.processed.to_string().green());
    if report.skipped > 0 {
        println!("  Skipped:   {}", report.skipped.to_string().yellow());
        for error in report.errors.iter().take(MAX_ERRORS_SHOWN) {
            println!("    row {}: {}", error.row, error.message);
        }
        if report.errors.len() > MAX_ERRORS_SHOWN {
            println!(
                "    {}",
                format!("... and {} more", report.errors.len() - MAX_ERRORS_SHOWN).dimmed()
            );
        }
    } else {
        println!("  Skipped:   0");
    }

    match &output.precompute {
        Some(pre) => println!(
            "{} Embedded {} candidates with {}",
            "✓".green().bold(),
            pre.count,
            pre.model.cyan()
        ),
        None if report.processed > 0 => {
            println!("Embeddings not updated; run `cvm precompute` before matching");
        }
        None => {}
    }
}

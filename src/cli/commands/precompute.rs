//! cvm precompute - Recompute embeddings for all candidates

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_robot, robot_ok};
use crate::cli::progress::ProgressReporter;
use crate::error::Result;
use crate::storage::{PrecomputeReport, precompute_all_with_progress};

#[derive(Args, Debug)]
pub struct PrecomputeArgs {}

pub fn run(ctx: &AppContext, _args: &PrecomputeArgs) -> Result<()> {
    let reporter = ProgressReporter::new(ctx.robot_mode, ctx.quiet);
    let report = precompute_with_progress(ctx, &reporter)?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(&report));
    }

    println!(
        "{} Embedded {} candidates ({} dims, {})",
        "✓".green().bold(),
        report.count,
        report.dims,
        report.model.cyan()
    );
    println!("  Artifact: {}", ctx.store.artifact_path().display());
    Ok(())
}

/// Embed every stored candidate, replacing the artifact.
pub(crate) fn precompute_with_progress(
    ctx: &AppContext,
    reporter: &ProgressReporter,
) -> Result<PrecomputeReport> {
    let candidates = ctx.db.all_candidate_texts()?;
    let embedder = ctx.embedder()?;

    let bar = reporter.progress(candidates.len() as u64, "Embedding candidates");
    match precompute_all_with_progress(&ctx.store, embedder, &candidates, |done| {
        bar.set_position(done as u64);
    }) {
        Ok(report) => {
            bar.finish_with_message(&format!("{} embeddings written", report.count));
            Ok(report)
        }
        Err(err) => {
            bar.abandon_with_message(&err.to_string());
            Err(err)
        }
    }
}

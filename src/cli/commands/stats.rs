//! cvm stats - Show database and embedding statistics

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::Result;
use crate::storage::{DatabaseStats, EmbeddingStats, EmbeddingStore};

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Number of top skills to list
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    database: DatabaseStats,
    embeddings: EmbeddingStats,
    /// Candidates without a stored embedding.
    unembedded: i64,
}

pub fn run(ctx: &AppContext, args: &StatsArgs) -> Result<()> {
    let database = ctx.db.stats()?;
    let embeddings = ctx.store.stats()?;
    let embedded = i64::try_from(embeddings.count).unwrap_or(i64::MAX);
    let output = StatsOutput {
        unembedded: (database.total_candidates - embedded).max(0),
        database,
        embeddings,
    };

    if ctx.robot_mode {
        return emit_robot(&robot_ok(&output));
    }

    emit_human(render(&output, args.top))
}

fn render(output: &StatsOutput, top: usize) -> HumanLayout {
    let db = &output.database;
    let emb = &output.embeddings;

    let mut layout = HumanLayout::new();
    layout
        .title("cvm statistics")
        .section("Candidates")
        .kv("Total", &db.total_candidates.to_string())
        .kv("Distinct skills", &db.total_skills.to_string())
        .kv(
            "Avg experience",
            &format!("{:.1} years", db.avg_experience_years),
        )
        .blank();

    if !db.categories.is_empty() {
        layout.section("Categories");
        for (category, count) in &db.categories {
            layout.kv(category, &count.to_string());
        }
        layout.blank();
    }

    if !db.top_skills.is_empty() {
        layout.section("Top skills");
        for (skill, count) in db.top_skills.iter().take(top) {
            layout.kv(skill, &count.to_string());
        }
        layout.blank();
    }

    if !db.experience_distribution.is_empty() {
        layout.section("Experience");
        for (years, count) in &db.experience_distribution {
            layout.kv(&format!("{years} years"), &count.to_string());
        }
        layout.blank();
    }

    layout.section("Embeddings");
    if emb.exists {
        layout
            .kv("Stored", &emb.count.to_string())
            .kv(
                "Dimensions",
                &emb.dims.map_or_else(|| "-".to_string(), |d| d.to_string()),
            )
            .kv("Models", &emb.models.join(", "))
            .kv("Artifact size", &format!("{:.2} MB", emb.file_size_mb))
            .kv("Checksum", emb.checksum.as_deref().unwrap_or("-"));
    } else {
        layout.kv("Stored", &"none".yellow().to_string());
    }
    if output.unembedded > 0 {
        layout.push_line(format!(
            "{} {} candidates have no embedding; run `cvm precompute`",
            "!".yellow(),
            output.unembedded
        ));
    }
    layout
}

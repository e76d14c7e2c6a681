//! cvm ingest - Parse and store a single résumé

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::commands::text_or_file;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::Result;
use crate::ingest::ingest_one;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Résumé text
    #[arg(required_unless_present = "file")]
    pub text: Option<String>,

    /// Read the résumé from a file instead
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// Job category label (e.g. INFORMATION-TECHNOLOGY)
    #[arg(long, short)]
    pub category: Option<String>,
}

pub fn run(ctx: &AppContext, args: &IngestArgs) -> Result<()> {
    let text = text_or_file(args.text.as_deref(), args.file.as_deref(), "résumé")?;
    let ingested = ingest_one(
        &ctx.db,
        &ctx.store,
        ctx.embedder()?,
        &text,
        args.category.as_deref(),
    )?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(&ingested));
    }

    let resume = &ingested.resume;
    let mut layout = HumanLayout::new();
    layout
        .push_line(format!(
            "{} Stored candidate #{}",
            "✓".green().bold(),
            ingested.candidate_id
        ))
        .blank()
        .kv("Name", &resume.name)
        .kv("Email", resume.email.as_deref().unwrap_or("-"))
        .kv("Phone", resume.phone.as_deref().unwrap_or("-"))
        .kv("Experience", &format!("{} years", resume.experience_years))
        .kv("Category", resume.category.as_deref().unwrap_or("-"))
        .kv("Skills", &resume.skills_display());
    emit_human(layout)
}

//! cvm show - Show a candidate profile

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::{CvmError, Result};
use crate::ingest::parser::SKILLS_NOT_SPECIFIED;
use crate::storage::{CandidateDetails, EmbeddingStore};

const TEXT_WIDTH: usize = 88;
/// Characters of résumé text shown without `--full`.
const PREVIEW_CHARS: usize = 600;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Candidate id
    pub id: i64,

    /// Print the full résumé text
    #[arg(long)]
    pub full: bool,
}

pub fn run(ctx: &AppContext, args: &ShowArgs) -> Result<()> {
    let details = ctx
        .db
        .candidate_details(args.id)?
        .ok_or(CvmError::CandidateNotFound(args.id))?;
    let embedded = ctx.store.get(args.id)?.map(|e| e.model);

    if ctx.robot_mode {
        let data = serde_json::json!({
            "candidate": details,
            "embedding_model": embedded,
        });
        return emit_robot(&robot_ok(data));
    }

    emit_human(render(&details, embedded.as_deref(), args.full))
}

fn render(details: &CandidateDetails, embedding_model: Option<&str>, full: bool) -> HumanLayout {
    let skills = if details.skills.is_empty() {
        SKILLS_NOT_SPECIFIED.to_string()
    } else {
        details.skills.join(", ")
    };

    let mut layout = HumanLayout::new();
    layout
        .title(&format!("{} #{}", details.name, details.id))
        .kv("Email", details.email.as_deref().unwrap_or("-"))
        .kv("Phone", details.phone.as_deref().unwrap_or("-"))
        .kv("Category", details.category.as_deref().unwrap_or("-"))
        .kv("Experience", &format!("{} years", details.experience_years))
        .kv("Added", &details.created_at)
        .kv(
            "Embedding",
            &embedding_model.map_or_else(|| "missing".red().to_string(), ToString::to_string),
        )
        .blank()
        .section("Skills")
        .paragraph(&skills, TEXT_WIDTH)
        .blank()
        .section("Education")
        .paragraph(details.education.as_deref().unwrap_or("-"), TEXT_WIDTH);

    if let Some(text) = details.full_text.as_deref() {
        let (body, truncated) = preview(text, full);
        layout.blank().section("Résumé").paragraph(&body, TEXT_WIDTH);
        if truncated {
            layout.push_line("  ... (use --full for the complete text)".dimmed().to_string());
        }
    }
    layout
}

/// Collapsed whitespace, cut at [`PREVIEW_CHARS`] unless `full`.
fn preview(text: &str, full: bool) -> (String, bool) {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if full || collapsed.chars().count() <= PREVIEW_CHARS {
        return (collapsed, false);
    }
    (collapsed.chars().take(PREVIEW_CHARS).collect(), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_text() {
        let text = "word ".repeat(500);
        let (body, truncated) = preview(&text, false);
        assert!(truncated);
        assert_eq!(body.chars().count(), PREVIEW_CHARS);

        let (body, truncated) = preview(&text, true);
        assert!(!truncated);
        assert!(body.chars().count() > PREVIEW_CHARS);
    }

    #[test]
    fn preview_collapses_whitespace() {
        let (body, truncated) = preview("Jane\n\n  Doe\tRust", false);
        assert_eq!(body, "Jane Doe Rust");
        assert!(!truncated);
    }
}

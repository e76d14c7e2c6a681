//! cvm match - Rank candidates against a job description

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use crate::app::AppContext;
use crate::cli::commands::text_or_file;
use crate::cli::output::{colored_score, emit_robot, robot_ok};
use crate::error::Result;
use crate::ingest::parser::extract_skills;
use crate::search::{MatchMode, MatchWeights, RankDiagnostics, RankedCandidate};

const DEFAULT_JOB_TITLE: &str = "Untitled job";

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Job description text
    #[arg(required_unless_present = "file")]
    pub query: Option<String>,

    /// Read the job description from a file instead
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// Scoring mode
    #[arg(long, short, value_enum, default_value_t = ModeArg::Hybrid)]
    pub mode: ModeArg,

    /// Weight of the semantic score [default: from config, 0.7]
    #[arg(long)]
    pub semantic_weight: Option<f32>,

    /// Weight of the keyword score [default: 1 - semantic weight]
    #[arg(long)]
    pub keyword_weight: Option<f32>,

    /// Number of candidates to show [default: from config, 10]
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Store the job description and these results in the database
    #[arg(long)]
    pub record: bool,

    /// Job title used with --record
    #[arg(long, requires = "record")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Cosine similarity only
    Semantic,
    /// Weighted semantic + keyword overlap
    Hybrid,
}

impl From<ModeArg> for MatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Semantic => Self::Semantic,
            ModeArg::Hybrid => Self::Hybrid,
        }
    }
}

#[derive(Debug, Serialize)]
struct MatchOutput<'a> {
    mode: MatchMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    weights: Option<MatchWeights>,
    total_ranked: usize,
    results: &'a [RankedCandidate],
    diagnostics: RankDiagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_id: Option<i64>,
}

pub fn run(ctx: &AppContext, args: &MatchArgs) -> Result<()> {
    let query = text_or_file(args.query.as_deref(), args.file.as_deref(), "job description")?;
    let mode = MatchMode::from(args.mode);
    let weights = resolve_weights(ctx, args);

    let outcome = ctx.rank(&query, mode, weights)?;
    let limit = args.limit.unwrap_or(ctx.config.search.top_n as usize);
    let shown = &outcome.results[..outcome.results.len().min(limit)];

    let job_id = if args.record || ctx.config.search.record_results {
        Some(record(ctx, args, &query, shown)?)
    } else {
        None
    };

    let output = MatchOutput {
        mode,
        weights: (mode == MatchMode::Hybrid).then_some(weights),
        total_ranked: outcome.results.len(),
        results: shown,
        diagnostics: outcome.diagnostics,
        job_id,
    };

    if ctx.robot_mode {
        let warnings = diagnostic_warnings(&output.diagnostics);
        return emit_robot(&robot_ok(&output).with_warnings(warnings));
    }

    print_human(&output);
    Ok(())
}

/// Explicit flags win; a lone `--semantic-weight` implies `1 - w` for keywords.
fn resolve_weights(ctx: &AppContext, args: &MatchArgs) -> MatchWeights {
    let search = &ctx.config.search;
    match (args.semantic_weight, args.keyword_weight) {
        (Some(semantic), Some(keyword)) => MatchWeights::new(semantic, keyword),
        (Some(semantic), None) => MatchWeights::from_semantic(semantic),
        (None, Some(keyword)) => MatchWeights::new(1.0 - keyword, keyword),
        (None, None) => MatchWeights::new(search.semantic_weight, search.keyword_weight),
    }
}

fn record(
    ctx: &AppContext,
    args: &MatchArgs,
    query: &str,
    results: &[RankedCandidate],
) -> Result<i64> {
    let title = args.title.as_deref().unwrap_or(DEFAULT_JOB_TITLE);
    let skills = extract_skills(query);
    let required = (!skills.is_empty()).then(|| skills.join(", "));

    let job_id = ctx
        .db
        .insert_job_description(title, query, required.as_deref())?;
    let count = ctx.db.record_match_results(job_id, results)?;
    info!(job_id, count, "recorded match results");
    Ok(job_id)
}

fn diagnostic_warnings(diagnostics: &RankDiagnostics) -> Vec<String> {
    let mut warnings = Vec::new();
    if diagnostics.query_degenerate {
        warnings.push(
            "job description has no embeddable terms; semantic scores are 0".to_string(),
        );
    }
    if diagnostics.stale > 0 {
        warnings.push(format!(
            "{} embeddings belong to removed candidates",
            diagnostics.stale
        ));
    }
    if diagnostics.model_mismatch > 0 {
        warnings.push(format!(
            "{} embeddings were produced by a different model; run `cvm precompute`",
            diagnostics.model_mismatch
        ));
    }
    if diagnostics.invalid_vector > 0 {
        warnings.push(format!(
            "{} embeddings were unusable (wrong dimension or zero norm)",
            diagnostics.invalid_vector
        ));
    }
    if diagnostics.missing_text > 0 {
        warnings.push(format!(
            "{} candidates had no résumé text",
            diagnostics.missing_text
        ));
    }
    warnings
}

fn print_human(output: &MatchOutput<'_>) {
    match output.weights {
        Some(w) => println!(
            "{} (semantic {:.2}, keyword {:.2})",
            "Hybrid ranking".bold(),
            w.semantic,
            w.keyword
        ),
        None => println!("{}", "Semantic ranking".bold()),
    }
    println!();

    if output.results.is_empty() {
        println!("No candidates ranked.");
    }

    for (rank, candidate) in output.results.iter().enumerate() {
        let keyword = candidate
            .keyword_score
            .map_or_else(|| "-".dimmed().to_string(), colored_score);
        println!(
            "{:>3}. {} {}",
            rank + 1,
            candidate.name.bold(),
            format!("#{}", candidate.candidate_id).dimmed()
        );
        println!(
            "     combined {}  semantic {}  keyword {}",
            colored_score(candidate.combined_score),
            colored_score(candidate.semantic_score),
            keyword
        );
    }

    if output.total_ranked > output.results.len() {
        println!();
        println!(
            "{}",
            format!(
                "Showing {} of {} ranked candidates (use --limit)",
                output.results.len(),
                output.total_ranked
            )
            .dimmed()
        );
    }

    for warning in diagnostic_warnings(&output.diagnostics) {
        eprintln!("{} {warning}", "!".yellow());
    }

    if let Some(job_id) = output.job_id {
        println!();
        println!("Recorded as job #{job_id}");
    }
}

//! cvm search - Search candidates by name or skill

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{emit_robot, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Substring matched against candidate names and skills
    pub query: Option<String>,

    /// Only candidates in this category
    #[arg(long, short)]
    pub category: Option<String>,

    /// Maximum number of results
    #[arg(long, short = 'n', default_value_t = 50)]
    pub limit: usize,
}

pub fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let results =
        ctx.db
            .search_candidates(args.query.as_deref(), args.category.as_deref(), args.limit)?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(serde_json::json!({
            "query": args.query,
            "category": args.category,
            "count": results.len(),
            "results": results,
        })));
    }

    if results.is_empty() {
        println!("No candidates found.");
        return Ok(());
    }

    println!("{} ({})", "Candidates".bold(), results.len());
    println!();
    for candidate in &results {
        println!(
            "{:>6}  {}  {}",
            format!("#{}", candidate.id).dimmed(),
            candidate.name.bold(),
            candidate.category.as_deref().unwrap_or("-").cyan()
        );
        let skills = if candidate.skills.is_empty() {
            "-".to_string()
        } else {
            candidate.skills.join(", ")
        };
        println!(
            "        {} yrs · {}",
            candidate.experience_years,
            textwrap::fill(&skills, 72).replace('\n', "\n        ")
        );
    }
    Ok(())
}

//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use std::fs;
use std::path::Path;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::{CvmError, Result};

pub mod batch;
pub mod completions;
pub mod config;
pub mod embed;
pub mod ingest;
pub mod init;
pub mod matching;
pub mod precompute;
pub mod search;
pub mod show;
pub mod stats;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Init(args) => init::run(ctx, args),
        Commands::Ingest(args) => ingest::run(ctx, args),
        Commands::Batch(args) => batch::run(ctx, args),
        Commands::Precompute(args) => precompute::run(ctx, args),
        Commands::Match(args) => matching::run(ctx, args),
        Commands::Show(args) => show::run(ctx, args),
        Commands::Search(args) => search::run(ctx, args),
        Commands::Stats(args) => stats::run(ctx, args),
        Commands::Embed(args) => embed::run(ctx, args),
        Commands::Config(args) => config::run(ctx, args),
        Commands::Completions(args) => completions::run(args),
    }
}

/// Positional text, or the contents of `file` when given.
pub(crate) fn text_or_file(text: Option<&str>, file: Option<&Path>, what: &str) -> Result<String> {
    let content = match (text, file) {
        (_, Some(path)) => fs::read_to_string(path)?,
        (Some(text), None) => text.to_string(),
        (None, None) => {
            return Err(CvmError::InvalidInput(format!("no {what} given")));
        }
    };
    if content.trim().is_empty() {
        return Err(CvmError::InvalidInput(format!("{what} is empty")));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::UnitTestFixture;

    #[test]
    fn text_or_file_prefers_file() {
        let fixture = UnitTestFixture::new();
        let path = fixture.create_file("job.txt", "rust engineer");
        let text = text_or_file(Some("ignored"), Some(&path), "job description").unwrap();
        assert_eq!(text, "rust engineer");
    }

    #[test]
    fn text_or_file_rejects_missing_and_blank() {
        assert!(matches!(
            text_or_file(None, None, "query"),
            Err(CvmError::InvalidInput(_))
        ));
        assert!(matches!(
            text_or_file(Some("  \n"), None, "query"),
            Err(CvmError::InvalidInput(_))
        ));
    }

    #[test]
    fn text_or_file_missing_file_is_io_error() {
        let err = text_or_file(None, Some(Path::new("/nonexistent/cv.txt")), "résumé")
            .unwrap_err();
        assert!(matches!(err, CvmError::Io(_)));
    }
}

//! Single-résumé and CSV batch ingestion.

use std::fs::File;
use std::path::Path;

use csv::Reader;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::error::{CvmError, Result};
use crate::ingest::parser::{ParsedResume, UNKNOWN_NAME, parse_resume};
use crate::search::Embedder;
use crate::storage::{Database, EmbeddingStore};

/// A freshly stored candidate.
#[derive(Debug, Clone, Serialize)]
pub struct IngestedCandidate {
    pub candidate_id: i64,
    pub resume: ParsedResume,
}

/// Column names read by [`ingest_csv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvColumns {
    pub resume: String,
    pub category: String,
    pub id: String,
}

impl From<&IngestConfig> for CsvColumns {
    fn from(config: &IngestConfig) -> Self {
        Self {
            resume: config.resume_column.clone(),
            category: config.category_column.clone(),
            id: config.id_column.clone(),
        }
    }
}

/// A CSV row that could not be stored. `row` is 1-based, header excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub errors: Vec<RowError>,
}

impl BatchReport {
    fn skip(&mut self, row: usize, message: String) {
        warn!(row, %message, "skipping CSV row");
        self.skipped += 1;
        self.errors.push(RowError { row, message });
    }
}

/// Parse, store and embed one résumé.
///
/// The candidate row is committed before its embedding is written; if the
/// embedding write fails the error is returned and `cvm precompute` repairs
/// the store.
pub fn ingest_one(
    db: &Database,
    store: &dyn EmbeddingStore,
    embedder: &dyn Embedder,
    text: &str,
    category: Option<&str>,
) -> Result<IngestedCandidate> {
    if text.trim().is_empty() {
        return Err(CvmError::InvalidInput("résumé text is empty".to_string()));
    }

    let resume = parse_resume(text, category);
    let candidate_id = db.insert_candidate(&resume)?;
    let vector = embedder.embed(&resume.full_text)?;
    store.put_one(candidate_id, &vector, embedder.name())?;

    info!(candidate_id, name = %resume.name, "ingested candidate");
    Ok(IngestedCandidate {
        candidate_id,
        resume,
    })
}

/// Insert every row of a résumé CSV. Embeddings are not written; run
/// precompute afterwards.
pub fn ingest_csv(db: &Database, path: &Path, columns: &CsvColumns) -> Result<BatchReport> {
    ingest_csv_with_progress(db, path, columns, |_| {})
}

/// [`ingest_csv`] with a callback invoked after each row.
///
/// A missing résumé column fails before any row is read. Bad rows are
/// counted and recorded in the report; they never abort the batch.
pub fn ingest_csv_with_progress(
    db: &Database,
    path: &Path,
    columns: &CsvColumns,
    mut on_row: impl FnMut(usize),
) -> Result<BatchReport> {
    let file = File::open(path)?;
    let mut reader = Reader::from_reader(file);

    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let resume_idx = position(&columns.resume).ok_or_else(|| {
        CvmError::InvalidInput(format!(
            "column '{}' not found in {}",
            columns.resume,
            path.display()
        ))
    })?;
    let category_idx = position(&columns.category);
    let id_idx = position(&columns.id);

    let mut report = BatchReport::default();

    for (idx, result) in reader.records().enumerate() {
        let row = idx + 1;
        report.total += 1;

        match result {
            Err(err) => report.skip(row, format!("unreadable row: {err}")),
            Ok(record) => {
                let text = record.get(resume_idx).unwrap_or_default();
                if text.trim().is_empty() {
                    report.skip(row, "empty résumé text".to_string());
                } else {
                    let category = category_idx.and_then(|i| record.get(i));
                    let mut resume = parse_resume(text, category);
                    if resume.name == UNKNOWN_NAME {
                        if let Some(id) = id_idx.and_then(|i| record.get(i)).map(str::trim) {
                            if !id.is_empty() {
                                resume.name = format!("Candidate_{id}");
                            }
                        }
                    }

                    match db.insert_candidate(&resume) {
                        Ok(_) => report.processed += 1,
                        Err(err) => report.skip(row, err.to_string()),
                    }
                }
            }
        }

        on_row(row);
    }

    info!(
        total = report.total,
        processed = report.processed,
        skipped = report.skipped,
        "batch ingest finished"
    );
    Ok(report)
}

//! Résumé ingestion: field extraction and storage.

pub mod parser;
pub mod pipeline;

pub use parser::{ParsedResume, parse_resume};
pub use pipeline::{
    BatchReport, CsvColumns, IngestedCandidate, RowError, ingest_csv, ingest_csv_with_progress,
    ingest_one,
};

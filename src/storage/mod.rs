//! Storage layer for cvm
//!
//! SQLite holds candidates and the match audit log; a single file artifact
//! holds the embedding vectors.

use std::collections::BTreeMap;

use crate::error::Result;

pub mod embeddings;
pub mod migrations;
pub mod sqlite;

pub use embeddings::{
    EmbeddingCollection, EmbeddingStats, EmbeddingStore, FileEmbeddingStore, PrecomputeReport,
    StoredEmbedding, precompute_all, precompute_all_with_progress,
};
pub use sqlite::{CandidateDetails, CandidateSummary, Database, DatabaseStats};

/// Read-only candidate projections consumed by the rankers.
pub trait CandidateLookup {
    /// `id -> name` for every stored candidate.
    fn candidate_names(&self) -> Result<BTreeMap<i64, String>>;

    /// Résumé text, `None` when the candidate is gone or has no text.
    fn full_text(&self, candidate_id: i64) -> Result<Option<String>>;
}

//! Semantic ranking against precomputed candidate embeddings.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CvmError, Result};
use crate::search::embeddings::Embedder;
use crate::search::similarity::cosine_similarity;
use crate::storage::EmbeddingStore;

/// One candidate scored by cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticMatch {
    pub candidate_id: i64,
    pub name: String,
    pub score: f32,
}

/// Why stored entries were left out of a ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RankDiagnostics {
    /// Entries in the embedding store.
    pub stored: usize,
    /// Entries whose candidate no longer exists.
    pub stale: usize,
    /// Entries produced by a different embedding model.
    pub model_mismatch: usize,
    /// Entries with the wrong dimension or a zero norm.
    pub invalid_vector: usize,
    /// Candidates whose résumé text vanished before keyword scoring.
    pub missing_text: usize,
    /// The query embedded to a zero vector, so every semantic score is 0.
    pub query_degenerate: bool,
}

impl RankDiagnostics {
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.stale + self.model_mismatch + self.invalid_vector + self.missing_text
    }
}

/// Ranked results plus the skip counts that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct RankOutcome<T> {
    pub results: Vec<T>,
    pub diagnostics: RankDiagnostics,
}

/// Scores every stored embedding against an embedded query.
pub struct SemanticRanker<'a> {
    embedder: &'a dyn Embedder,
    store: &'a dyn EmbeddingStore,
}

impl<'a> SemanticRanker<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a dyn EmbeddingStore) -> Self {
        Self { embedder, store }
    }

    pub const fn embedder(&self) -> &'a dyn Embedder {
        self.embedder
    }

    /// Rank candidates in `candidate_names` by similarity to `query`,
    /// best first.
    pub fn rank(
        &self,
        query: &str,
        candidate_names: &BTreeMap<i64, String>,
    ) -> Result<Vec<SemanticMatch>> {
        Ok(self.rank_with_diagnostics(query, candidate_names)?.results)
    }

    /// [`rank`](Self::rank), also reporting skipped entries.
    ///
    /// Fails with [`CvmError::NoEmbeddings`] when the store is empty. Stale
    /// ids, foreign-model entries and unusable vectors are skipped; ties
    /// keep ascending candidate id order. A query with no embeddable terms
    /// scores every usable entry 0.0 and sets
    /// [`RankDiagnostics::query_degenerate`].
    pub fn rank_with_diagnostics(
        &self,
        query: &str,
        candidate_names: &BTreeMap<i64, String>,
    ) -> Result<RankOutcome<SemanticMatch>> {
        let query_vector = self.embedder.embed(query)?;
        let stored = self.store.load_all()?;
        if stored.is_empty() {
            return Err(CvmError::NoEmbeddings);
        }

        let query_degenerate = !is_usable(&query_vector);
        if query_degenerate {
            warn!("query has no embeddable terms; semantic scores are 0");
        }

        let model = self.embedder.name();
        let mut diagnostics = RankDiagnostics {
            stored: stored.len(),
            query_degenerate,
            ..RankDiagnostics::default()
        };
        let mut results = Vec::with_capacity(stored.len());

        for (candidate_id, entry) in &stored {
            let Some(name) = candidate_names.get(candidate_id) else {
                debug!(candidate_id, "skipping embedding for removed candidate");
                diagnostics.stale += 1;
                continue;
            };

            if entry.model != model {
                warn!(
                    candidate_id,
                    stored_model = %entry.model,
                    query_model = model,
                    "skipping embedding from a different model"
                );
                diagnostics.model_mismatch += 1;
                continue;
            }

            let scored = if query_degenerate {
                usable_entry(&entry.vector, query_vector.len()).map(|()| 0.0)
            } else {
                cosine_similarity(&query_vector, &entry.vector)
            };
            match scored {
                Ok(score) => results.push(SemanticMatch {
                    candidate_id: *candidate_id,
                    name: name.clone(),
                    score,
                }),
                Err(err) => {
                    warn!(candidate_id, error = %err, "skipping unusable embedding");
                    diagnostics.invalid_vector += 1;
                }
            }
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(RankOutcome {
            results,
            diagnostics,
        })
    }
}

fn is_usable(vector: &[f32]) -> bool {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    norm.is_finite() && norm > 0.0
}

fn usable_entry(vector: &[f32], dims: usize) -> Result<()> {
    if vector.len() != dims {
        return Err(CvmError::DimensionMismatch {
            expected: dims,
            actual: vector.len(),
        });
    }
    if !is_usable(vector) {
        return Err(CvmError::DegenerateVector("zero-norm vector".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryEmbeddingStore, StubEmbedder};

    fn names(pairs: &[(i64, &str)]) -> BTreeMap<i64, String> {
        pairs
            .iter()
            .map(|(id, name)| (*id, (*name).to_string()))
            .collect()
    }

    #[test]
    fn empty_store_is_an_error() {
        let embedder = StubEmbedder::new(vec![("query", vec![1.0, 0.0])]);
        let store = MemoryEmbeddingStore::default();
        let ranker = SemanticRanker::new(&embedder, &store);

        let err = ranker.rank("query", &names(&[(1, "A")])).unwrap_err();
        assert!(matches!(err, CvmError::NoEmbeddings));
    }

    #[test]
    fn ranks_by_descending_similarity() {
        let embedder = StubEmbedder::new(vec![("query", vec![1.0, 0.0])]);
        let store = MemoryEmbeddingStore::with_entries(
            embedder.name(),
            vec![(1, vec![0.0, 1.0]), (2, vec![1.0, 0.0]), (3, vec![1.0, 1.0])],
        );
        let ranker = SemanticRanker::new(&embedder, &store);

        let results = ranker
            .rank("query", &names(&[(1, "A"), (2, "B"), (3, "C")]))
            .unwrap();
        let ids: Vec<i64> = results.iter().map(|r| r.candidate_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[0].name, "B");
    }

    #[test]
    fn ties_keep_ascending_id_order() {
        let embedder = StubEmbedder::new(vec![("query", vec![1.0, 0.0])]);
        let store = MemoryEmbeddingStore::with_entries(
            embedder.name(),
            vec![(9, vec![1.0, 0.0]), (4, vec![2.0, 0.0]), (6, vec![3.0, 0.0])],
        );
        let ranker = SemanticRanker::new(&embedder, &store);

        let results = ranker
            .rank("query", &names(&[(4, "D"), (6, "F"), (9, "I")]))
            .unwrap();
        let ids: Vec<i64> = results.iter().map(|r| r.candidate_id).collect();
        assert_eq!(ids, vec![4, 6, 9]);
    }

    #[test]
    fn skips_stale_foreign_and_invalid_entries() {
        let embedder = StubEmbedder::new(vec![("query", vec![1.0, 0.0])]);
        let mut store = MemoryEmbeddingStore::with_entries(
            embedder.name(),
            vec![
                (1, vec![1.0, 0.0]),
                (2, vec![1.0, 0.0, 0.0]),
                (3, vec![0.0, 0.0]),
                (4, vec![0.5, 0.5]),
            ],
        );
        store.insert(5, vec![1.0, 0.0], "other-model");
        let ranker = SemanticRanker::new(&embedder, &store);

        // 4 is stale: it has an embedding but no candidate row
        let outcome = ranker
            .rank_with_diagnostics("query", &names(&[(1, "A"), (2, "B"), (3, "C"), (5, "E")]))
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].candidate_id, 1);
        assert_eq!(outcome.diagnostics.stored, 5);
        assert_eq!(outcome.diagnostics.stale, 1);
        assert_eq!(outcome.diagnostics.model_mismatch, 1);
        assert_eq!(outcome.diagnostics.invalid_vector, 2);
        assert_eq!(outcome.diagnostics.skipped(), 4);
    }

    #[test]
    fn candidates_without_embeddings_are_not_ranked() {
        let embedder = StubEmbedder::new(vec![("query", vec![1.0, 0.0])]);
        let store = MemoryEmbeddingStore::with_entries(embedder.name(), vec![(1, vec![1.0, 0.0])]);
        let ranker = SemanticRanker::new(&embedder, &store);

        let results = ranker.rank("query", &names(&[(1, "A"), (2, "B")])).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn query_without_terms_scores_every_candidate_zero() {
        // unknown text embeds to all zeros
        let embedder = StubEmbedder::new(vec![("query", vec![1.0, 0.0])]);
        let store = MemoryEmbeddingStore::with_entries(
            embedder.name(),
            vec![(1, vec![1.0, 0.0]), (2, vec![0.0, 1.0]), (3, vec![0.0, 0.0])],
        );
        let ranker = SemanticRanker::new(&embedder, &store);

        let outcome = ranker
            .rank_with_diagnostics("C / R", &names(&[(1, "A"), (2, "B"), (3, "C")]))
            .unwrap();

        let ids: Vec<i64> = outcome.results.iter().map(|r| r.candidate_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(outcome.results.iter().all(|r| r.score == 0.0));
        assert!(outcome.diagnostics.query_degenerate);
        // only the genuinely broken entry is blamed
        assert_eq!(outcome.diagnostics.invalid_vector, 1);
    }
}

//! Weighted linear fusion of semantic and keyword scores.
//!
//! ## Algorithm
//!
//! For every candidate returned by the semantic ranker:
//! ```text
//! combined(d) = w_semantic * cosine(q, d) + w_keyword * jaccard(tokens(q), tokens(d))
//! ```
//!
//! Weights must sum to 1 (within [`WEIGHT_TOLERANCE`]). Only candidates that
//! have a stored embedding are eligible; keyword overlap alone never ranks a
//! candidate.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::error::{CvmError, Result};
use crate::search::keywords::{jaccard, tokenize};
use crate::search::semantic::{RankOutcome, SemanticMatch, SemanticRanker};
use crate::storage::CandidateLookup;

/// Allowed distance of `semantic + keyword` from 1.0.
pub const WEIGHT_TOLERANCE: f32 = 0.01;

/// Fusion weights for the semantic and keyword scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchWeights {
    pub semantic: f32,
    pub keyword: f32,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            semantic: 0.7,
            keyword: 0.3,
        }
    }
}

impl MatchWeights {
    pub const fn new(semantic: f32, keyword: f32) -> Self {
        Self { semantic, keyword }
    }

    /// Weights with `keyword = 1 - semantic`.
    pub fn from_semantic(semantic: f32) -> Self {
        Self::new(semantic, 1.0 - semantic)
    }

    /// Both finite and summing to 1 within [`WEIGHT_TOLERANCE`].
    pub fn validate(&self) -> Result<()> {
        let finite = self.semantic.is_finite() && self.keyword.is_finite();
        if !finite || (self.semantic + self.keyword - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(CvmError::InvalidWeights {
                semantic: self.semantic,
                keyword: self.keyword,
            });
        }
        Ok(())
    }

    fn combine(&self, semantic: f32, keyword: f32) -> f32 {
        self.semantic * semantic + self.keyword * keyword
    }
}

/// Which scores a match run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Cosine similarity only; `keyword_score` is absent.
    Semantic,
    #[default]
    Hybrid,
}

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub candidate_id: i64,
    pub name: String,
    pub semantic_score: f32,
    /// `None` in semantic-only mode.
    pub keyword_score: Option<f32>,
    pub combined_score: f32,
}

impl From<SemanticMatch> for RankedCandidate {
    fn from(m: SemanticMatch) -> Self {
        Self {
            candidate_id: m.candidate_id,
            name: m.name,
            semantic_score: m.score,
            keyword_score: None,
            combined_score: m.score,
        }
    }
}

/// Re-scores semantic results with keyword overlap.
pub struct HybridRanker<'a> {
    semantic: SemanticRanker<'a>,
}

impl<'a> HybridRanker<'a> {
    pub const fn new(semantic: SemanticRanker<'a>) -> Self {
        Self { semantic }
    }

    /// Hybrid ranking, best combined score first.
    pub fn rank(
        &self,
        query: &str,
        weights: MatchWeights,
        lookup: &dyn CandidateLookup,
    ) -> Result<Vec<RankedCandidate>> {
        Ok(self.rank_with_diagnostics(query, weights, lookup)?.results)
    }

    /// [`rank`](Self::rank), also reporting skipped entries.
    ///
    /// Weights are validated before the query is embedded or anything is
    /// read. Candidates whose text disappears between the two lookups are
    /// skipped.
    pub fn rank_with_diagnostics(
        &self,
        query: &str,
        weights: MatchWeights,
        lookup: &dyn CandidateLookup,
    ) -> Result<RankOutcome<RankedCandidate>> {
        weights.validate()?;

        let names = lookup.candidate_names()?;
        let semantic = self.semantic.rank_with_diagnostics(query, &names)?;
        let mut diagnostics = semantic.diagnostics;

        let query_tokens: BTreeSet<String> = tokenize(query);
        let mut results = Vec::with_capacity(semantic.results.len());

        for m in semantic.results {
            let Some(text) = lookup.full_text(m.candidate_id)? else {
                debug!(candidate_id = m.candidate_id, "candidate text missing; skipping");
                diagnostics.missing_text += 1;
                continue;
            };

            let keyword = jaccard(&tokenize(&text), &query_tokens);
            results.push(RankedCandidate {
                combined_score: weights.combine(m.score, keyword),
                candidate_id: m.candidate_id,
                name: m.name,
                semantic_score: m.score,
                keyword_score: Some(keyword),
            });
        }

        results.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
        Ok(RankOutcome {
            results,
            diagnostics,
        })
    }

    /// Semantic-only ranking in the hybrid result shape.
    pub fn rank_semantic_only(
        &self,
        query: &str,
        lookup: &dyn CandidateLookup,
    ) -> Result<RankOutcome<RankedCandidate>> {
        let names = lookup.candidate_names()?;
        let semantic = self.semantic.rank_with_diagnostics(query, &names)?;
        Ok(RankOutcome {
            results: semantic.results.into_iter().map(Into::into).collect(),
            diagnostics: semantic.diagnostics,
        })
    }

    /// Dispatch on `mode`; `weights` only apply to [`MatchMode::Hybrid`].
    pub fn rank_mode(
        &self,
        query: &str,
        mode: MatchMode,
        weights: MatchWeights,
        lookup: &dyn CandidateLookup,
    ) -> Result<RankOutcome<RankedCandidate>> {
        match mode {
            MatchMode::Semantic => self.rank_semantic_only(query, lookup),
            MatchMode::Hybrid => self.rank_with_diagnostics(query, weights, lookup),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::HashEmbedder;
    use crate::search::embeddings::Embedder;
    use crate::storage::{EmbeddingStore, precompute_all};
    use crate::test_utils::{MemoryCandidates, MemoryEmbeddingStore, StubEmbedder};

    // =========================================================================
    // MatchWeights
    // =========================================================================

    #[test]
    fn default_weights_are_valid() {
        let weights = MatchWeights::default();
        assert!(weights.validate().is_ok());
        assert!((weights.semantic - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn weights_within_tolerance_are_accepted() {
        assert!(MatchWeights::new(0.7, 0.305).validate().is_ok());
        assert!(MatchWeights::from_semantic(0.25).validate().is_ok());
    }

    #[test]
    fn weights_outside_tolerance_are_rejected() {
        let err = MatchWeights::new(0.7, 0.5).validate().unwrap_err();
        assert!(matches!(err, CvmError::InvalidWeights { .. }));
        assert!(MatchWeights::new(f32::NAN, 1.0).validate().is_err());
        assert!(MatchWeights::new(f32::INFINITY, 0.0).validate().is_err());
    }

    // =========================================================================
    // HybridRanker
    // =========================================================================

    fn fixture() -> (StubEmbedder, MemoryEmbeddingStore, MemoryCandidates) {
        let embedder = StubEmbedder::new(vec![("rust developer", vec![1.0, 0.0])]);
        let store = MemoryEmbeddingStore::with_entries(
            embedder.name(),
            vec![(1, vec![1.0, 0.0]), (2, vec![0.8, 0.6])],
        );
        let lookup = MemoryCandidates::new(vec![
            (1, "Alice", "senior java engineer"),
            (2, "Bob", "rust developer"),
        ]);
        (embedder, store, lookup)
    }

    #[test]
    fn invalid_weights_fail_before_any_io() {
        let embedder = StubEmbedder::new(vec![]);
        // an empty store would raise NoEmbeddings if it were read
        let store = MemoryEmbeddingStore::default();
        let lookup = MemoryCandidates::new(vec![]);
        let ranker = HybridRanker::new(SemanticRanker::new(&embedder, &store));

        let err = ranker
            .rank("anything", MatchWeights::new(0.7, 0.5), &lookup)
            .unwrap_err();
        assert!(matches!(err, CvmError::InvalidWeights { .. }));
        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn keyword_overlap_can_reorder_semantic_results() {
        let (embedder, store, lookup) = fixture();
        let ranker = HybridRanker::new(SemanticRanker::new(&embedder, &store));

        // semantic alone prefers Alice (1.0 vs 0.8)
        let semantic = ranker.rank_semantic_only("rust developer", &lookup).unwrap();
        assert_eq!(semantic.results[0].candidate_id, 1);
        assert_eq!(semantic.results[0].keyword_score, None);
        assert_eq!(
            semantic.results[0].combined_score,
            semantic.results[0].semantic_score
        );

        // 0.5 * 0.8 + 0.5 * 1.0 = 0.9 beats 0.5 * 1.0 + 0.5 * 0.0 = 0.5
        let hybrid = ranker
            .rank("rust developer", MatchWeights::new(0.5, 0.5), &lookup)
            .unwrap();
        assert_eq!(hybrid[0].candidate_id, 2);
        assert!((hybrid[0].combined_score - 0.9).abs() < 1e-5);
        assert_eq!(hybrid[0].keyword_score, Some(1.0));
        assert_eq!(hybrid[1].keyword_score, Some(0.0));
    }

    #[test]
    fn combined_score_is_weighted_sum() {
        let (embedder, store, lookup) = fixture();
        let ranker = HybridRanker::new(SemanticRanker::new(&embedder, &store));
        let weights = MatchWeights::default();

        for r in ranker.rank("rust developer", weights, &lookup).unwrap() {
            let keyword = r.keyword_score.unwrap();
            let expected = weights.semantic * r.semantic_score + weights.keyword * keyword;
            assert!((r.combined_score - expected).abs() < 1e-6);
            assert!((0.0..=1.0).contains(&keyword));
        }
    }

    #[test]
    fn weight_one_on_semantic_matches_semantic_order() {
        let (embedder, store, lookup) = fixture();
        let ranker = HybridRanker::new(SemanticRanker::new(&embedder, &store));

        let hybrid = ranker
            .rank("rust developer", MatchWeights::new(1.0, 0.0), &lookup)
            .unwrap();
        let semantic = ranker.rank_semantic_only("rust developer", &lookup).unwrap();

        let hybrid_ids: Vec<i64> = hybrid.iter().map(|r| r.candidate_id).collect();
        let semantic_ids: Vec<i64> = semantic.results.iter().map(|r| r.candidate_id).collect();
        assert_eq!(hybrid_ids, semantic_ids);
    }

    #[test]
    fn missing_text_is_skipped() {
        let (embedder, store, mut lookup) = fixture();
        lookup.remove_text(2);
        let ranker = HybridRanker::new(SemanticRanker::new(&embedder, &store));

        let outcome = ranker
            .rank_mode("rust developer", MatchMode::Hybrid, MatchWeights::default(), &lookup)
            .unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.diagnostics.missing_text, 1);
    }

    #[test]
    fn empty_store_propagates_no_embeddings() {
        let embedder = StubEmbedder::new(vec![]);
        let store = MemoryEmbeddingStore::default();
        let lookup = MemoryCandidates::new(vec![(1, "A", "text")]);
        let ranker = HybridRanker::new(SemanticRanker::new(&embedder, &store));

        let err = ranker
            .rank("q", MatchWeights::default(), &lookup)
            .unwrap_err();
        assert!(matches!(err, CvmError::NoEmbeddings));
    }

    #[test]
    fn python_aws_query_prefers_matching_resume() {
        let embedder = HashEmbedder::default();
        let store = MemoryEmbeddingStore::default();
        let lookup = MemoryCandidates::new(vec![
            (1, "Ada", "Python developer with AWS and Docker experience"),
            (2, "Brian", "Java backend engineer, no cloud experience"),
        ]);
        let texts: Vec<(i64, String)> = vec![
            (1, "Python developer with AWS and Docker experience".to_string()),
            (2, "Java backend engineer, no cloud experience".to_string()),
        ];
        precompute_all(&store, &embedder, &texts).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 2);

        let ranker = HybridRanker::new(SemanticRanker::new(&embedder, &store));
        let results = ranker
            .rank(
                "Looking for Python AWS developer",
                MatchWeights::default(),
                &lookup,
            )
            .unwrap();

        assert_eq!(results[0].candidate_id, 1);
        assert!(results[0].semantic_score > results[1].semantic_score);
        assert!(results[0].keyword_score > results[1].keyword_score);
        assert!(results[0].combined_score > results[1].combined_score);
    }

    #[test]
    fn query_without_terms_keeps_every_candidate() {
        let embedder = HashEmbedder::new(64);
        let store = MemoryEmbeddingStore::default();
        let lookup = MemoryCandidates::new(vec![
            (1, "Ada", "Python developer"),
            (2, "Brian", "Java engineer"),
        ]);
        let texts: Vec<(i64, String)> = vec![
            (1, "Python developer".to_string()),
            (2, "Java engineer".to_string()),
        ];
        precompute_all(&store, &embedder, &texts).unwrap();

        let ranker = HybridRanker::new(SemanticRanker::new(&embedder, &store));
        let outcome = ranker
            .rank_with_diagnostics("C / R", MatchWeights::default(), &lookup)
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results.iter().all(|r| r.combined_score == 0.0));
        assert_eq!(outcome.diagnostics.invalid_vector, 0);
        assert!(outcome.diagnostics.query_degenerate);
        let ids: Vec<i64> = outcome.results.iter().map(|r| r.candidate_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}

//! In-memory test doubles.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::Result;
use crate::search::Embedder;
use crate::storage::{
    CandidateLookup, EmbeddingCollection, EmbeddingStats, EmbeddingStore, StoredEmbedding,
};

/// Embedder returning canned vectors; unknown text embeds to all zeros.
pub struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dims: usize,
    calls: Cell<usize>,
}

impl StubEmbedder {
    pub const NAME: &'static str = "stub";

    pub fn new(pairs: Vec<(&str, Vec<f32>)>) -> Self {
        let dims = pairs.first().map_or(2, |(_, v)| v.len());
        Self {
            vectors: pairs
                .into_iter()
                .map(|(text, vector)| (text.to_string(), vector))
                .collect(),
            dims,
            calls: Cell::new(0),
        }
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Embedder for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dims]))
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Embedding store kept in memory; no dimension or model checks.
#[derive(Default)]
pub struct MemoryEmbeddingStore {
    entries: RefCell<EmbeddingCollection>,
}

impl MemoryEmbeddingStore {
    pub fn with_entries(model: &str, entries: Vec<(i64, Vec<f32>)>) -> Self {
        let store = Self::default();
        for (id, vector) in entries {
            store.entries.borrow_mut().insert(
                id,
                StoredEmbedding {
                    vector,
                    model: model.to_string(),
                },
            );
        }
        store
    }

    pub fn insert(&mut self, candidate_id: i64, vector: Vec<f32>, model: &str) {
        self.entries.get_mut().insert(
            candidate_id,
            StoredEmbedding {
                vector,
                model: model.to_string(),
            },
        );
    }
}

impl EmbeddingStore for MemoryEmbeddingStore {
    fn get(&self, candidate_id: i64) -> Result<Option<StoredEmbedding>> {
        Ok(self.entries.borrow().get(&candidate_id).cloned())
    }

    fn put_one(&self, candidate_id: i64, vector: &[f32], model: &str) -> Result<()> {
        self.entries.borrow_mut().insert(
            candidate_id,
            StoredEmbedding {
                vector: vector.to_vec(),
                model: model.to_string(),
            },
        );
        Ok(())
    }

    fn put_all(&self, entries: BTreeMap<i64, Vec<f32>>, model: &str) -> Result<()> {
        let collection = entries
            .into_iter()
            .map(|(id, vector)| {
                (
                    id,
                    StoredEmbedding {
                        vector,
                        model: model.to_string(),
                    },
                )
            })
            .collect();
        *self.entries.borrow_mut() = collection;
        Ok(())
    }

    fn load_all(&self) -> Result<EmbeddingCollection> {
        Ok(self.entries.borrow().clone())
    }

    fn stats(&self) -> Result<EmbeddingStats> {
        let entries = self.entries.borrow();
        let models: BTreeSet<String> = entries.values().map(|e| e.model.clone()).collect();
        Ok(EmbeddingStats {
            exists: !entries.is_empty(),
            count: entries.len(),
            dims: entries.values().next().map(|e| e.vector.len()),
            models: models.into_iter().collect(),
            file_size_bytes: 0,
            file_size_mb: 0.0,
            checksum: None,
        })
    }
}

/// Candidate lookup over a fixed in-memory table.
#[derive(Debug, Default)]
pub struct MemoryCandidates {
    rows: BTreeMap<i64, (String, Option<String>)>,
}

impl MemoryCandidates {
    /// Rows of `(id, name, full_text)`.
    pub fn new(rows: Vec<(i64, &str, &str)>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|(id, name, text)| (id, (name.to_string(), Some(text.to_string()))))
                .collect(),
        }
    }

    /// Keep the candidate but drop its text.
    pub fn remove_text(&mut self, candidate_id: i64) {
        if let Some(row) = self.rows.get_mut(&candidate_id) {
            row.1 = None;
        }
    }
}

impl CandidateLookup for MemoryCandidates {
    fn candidate_names(&self) -> Result<BTreeMap<i64, String>> {
        Ok(self
            .rows
            .iter()
            .map(|(id, (name, _))| (*id, name.clone()))
            .collect())
    }

    fn full_text(&self, candidate_id: i64) -> Result<Option<String>> {
        Ok(self.rows.get(&candidate_id).and_then(|(_, text)| text.clone()))
    }
}

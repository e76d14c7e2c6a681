//! Candidate ranking engine
//!
//! Implements hybrid ranking: cosine similarity over text embeddings plus
//! Jaccard keyword overlap, fused by a weighted linear combination.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                    Job description (query)                     │
//! └────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌────────────────────────────────────────────────────────────────┐
//! │  SemanticRanker (semantic.rs)                                  │
//! │  embed query, cosine vs every stored embedding, sort           │
//! └────────────────────────────────────────────────────────────────┘
//!                                │ (id, name, semantic)
//!                                ▼
//! ┌────────────────────────────────────────────────────────────────┐
//! │  HybridRanker (hybrid.rs)                                      │
//! │  fetch résumé text, Jaccard keyword score, weighted sum, sort  │
//! └────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//!          (id, name, semantic, keyword, combined) ranked list
//! ```

pub mod embeddings;
#[cfg(feature = "minilm")]
pub mod embeddings_local;
pub mod hybrid;
pub mod keywords;
pub mod semantic;
pub mod similarity;

// Re-export main types
pub use embeddings::{Embedder, HashEmbedder, build_embedder};
#[cfg(feature = "minilm")]
pub use embeddings_local::MiniLmEmbedder;
pub use hybrid::{HybridRanker, MatchMode, MatchWeights, RankedCandidate, WEIGHT_TOLERANCE};
pub use keywords::{overlap_score, tokenize};
pub use semantic::{RankDiagnostics, RankOutcome, SemanticMatch, SemanticRanker};
pub use similarity::cosine_similarity;

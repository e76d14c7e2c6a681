//! cvmatch - hybrid résumé-to-job ranking.
//!
//! Résumés are parsed into candidate records, embedded with a hashing
//! embedder, and ranked against a job description by cosine similarity,
//! optionally fused with Jaccard keyword overlap.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod search;
pub mod storage;
pub mod test_utils;

pub use error::{CvmError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

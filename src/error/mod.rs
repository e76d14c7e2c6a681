//! Error handling for cvmatch.
//!
//! This module provides:
//! - [`CvmError`]: The main error enum for all cvm operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context

mod codes;
mod suggestions;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;
pub use suggestions::suggest_for_error;

/// Main error type for cvmatch operations.
#[derive(Error, Debug)]
pub enum CvmError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(
        "No embeddings found. Run `cvm precompute` to embed all candidates before matching"
    )]
    NoEmbeddings,

    #[error("Weights must sum to 1.0 (got semantic={semantic}, keyword={keyword})")]
    InvalidWeights { semantic: f32, keyword: f32 },

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Degenerate vector: {0}")]
    DegenerateVector(String),

    #[error("Embedding model mismatch: expected '{expected}', found '{actual}'")]
    ModelMismatch { expected: String, actual: String },

    #[error("No candidates to embed")]
    NoCandidates,

    #[error("Corrupt embedding artifact: {0}")]
    CorruptArtifact(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Candidate not found: {0}")]
    CandidateNotFound(i64),

    #[error("Duplicate candidate: {0}")]
    DuplicateCandidate(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock failed: {0}")]
    LockFailed(String),
}

impl CvmError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) | Self::Csv(_) | Self::Serialization(_) => ErrorCode::SerializationError,
            Self::NoEmbeddings => ErrorCode::EmbeddingsMissing,
            Self::InvalidWeights { .. } => ErrorCode::WeightsInvalid,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::DegenerateVector(_) => ErrorCode::DegenerateVector,
            Self::ModelMismatch { .. } => ErrorCode::ModelMismatch,
            Self::NoCandidates => ErrorCode::NoCandidates,
            Self::CorruptArtifact(_) => ErrorCode::ArtifactCorrupted,
            Self::Embedding(_) => ErrorCode::EmbeddingFailed,
            Self::CandidateNotFound(_) => ErrorCode::CandidateNotFound,
            Self::DuplicateCandidate(_) => ErrorCode::CandidateDuplicate,
            Self::InvalidInput(_) => ErrorCode::InputInvalid,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::LockFailed(_) => ErrorCode::LockFailed,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::CandidateNotFound(id) => Some(serde_json::json!({ "candidate_id": id })),
            Self::InvalidWeights { semantic, keyword } => Some(serde_json::json!({
                "semantic_weight": semantic,
                "keyword_weight": keyword,
            })),
            Self::DimensionMismatch { expected, actual } => {
                Some(serde_json::json!({ "expected": expected, "actual": actual }))
            }
            Self::ModelMismatch { expected, actual } => {
                Some(serde_json::json!({ "expected": expected, "actual": actual }))
            }
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_cvm_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
///
/// Emitted in robot mode so scripts can branch on `code` instead of parsing
/// messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "EMBEDDINGS_MISSING")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 201)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "ranking", "config")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from a [`CvmError`].
    #[must_use]
    pub fn from_cvm_error(err: &CvmError) -> Self {
        let code = err.code();
        let context = err.context();
        let suggestion = suggest_for_error(code, context.as_ref());

        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion,
            context,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }

    /// Add context to this error.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self.suggestion = suggest_for_error(self.code, self.context.as_ref());
        self
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&CvmError> for StructuredError {
    fn from(err: &CvmError) -> Self {
        Self::from_cvm_error(err)
    }
}

/// Result type alias using [`CvmError`].
pub type Result<T> = std::result::Result<T, CvmError>;

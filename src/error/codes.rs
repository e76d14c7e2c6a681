//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Candidate errors
//! - 2xx: Embedding store errors
//! - 3xx: Config errors
//! - 4xx: Ranking errors
//! - 6xx: Storage errors
//! - 8xx: Lock errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `CandidateNotFound` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Candidate errors (1xx)
    // ========================================
    /// E101: Requested candidate does not exist in the store
    CandidateNotFound,
    /// E102: A candidate with the same unique key already exists
    CandidateDuplicate,
    /// E103: Résumé text or CSV input is unusable
    InputInvalid,

    // ========================================
    // Embedding store errors (2xx)
    // ========================================
    /// E201: Ranking attempted before embeddings were precomputed
    EmbeddingsMissing,
    /// E202: Precompute was asked to run over an empty candidate set
    NoCandidates,
    /// E203: Embedding artifact failed structural or checksum validation
    ArtifactCorrupted,
    /// E204: The embedding backend failed to load or to embed text
    EmbeddingFailed,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,
    /// E304: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Ranking errors (4xx)
    // ========================================
    /// E401: Semantic and keyword weights do not sum to 1.0
    WeightsInvalid,
    /// E402: Two vectors with different dimensionality were compared
    DimensionMismatch,
    /// E403: A vector with zero (or non-finite) norm was compared
    DegenerateVector,
    /// E404: Vectors from different embedding models were mixed
    ModelMismatch,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E604: Database operation failed
    DatabaseError,
    /// E605: Serialization/deserialization failed
    SerializationError,
    /// E606: IO operation failed
    IoError,

    // ========================================
    // Lock errors (85x)
    // ========================================
    /// E851: Failed to acquire the artifact lock
    LockFailed,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `CandidateNotFound` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::CandidateNotFound => 101,
            Self::CandidateDuplicate => 102,
            Self::InputInvalid => 103,

            Self::EmbeddingsMissing => 201,
            Self::NoCandidates => 202,
            Self::ArtifactCorrupted => 203,
            Self::EmbeddingFailed => 204,

            Self::ConfigInvalid => 302,
            Self::ConfigMissingRequired => 304,

            Self::WeightsInvalid => 401,
            Self::DimensionMismatch => 402,
            Self::DegenerateVector => 403,
            Self::ModelMismatch => 404,

            Self::DatabaseError => 604,
            Self::SerializationError => 605,
            Self::IoError => 606,

            Self::LockFailed => 851,

            Self::InternalError => 901,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::CandidateNotFound => "Run `cvm search` to find candidate ids",
            Self::CandidateDuplicate => {
                "A candidate with this email is already stored; update or remove it first"
            }
            Self::InputInvalid => "Check the résumé text or CSV columns and try again",

            Self::EmbeddingsMissing => {
                "No embeddings found. Run `cvm precompute` before matching"
            }
            Self::NoCandidates => "Ingest résumés with `cvm ingest` or `cvm batch` first",
            Self::ArtifactCorrupted => {
                "The embedding artifact is damaged. Run `cvm precompute` to rebuild it"
            }
            Self::EmbeddingFailed => {
                "Check that the embedding model can be downloaded, or set search.embedding_backend = \"hash\""
            }

            Self::ConfigInvalid => "Check config.toml syntax and value types",
            Self::ConfigMissingRequired => "Set the missing value in config.toml or the environment",

            Self::WeightsInvalid => {
                "Semantic and keyword weights must sum to 1.0 (e.g. 0.7 and 0.3)"
            }
            Self::DimensionMismatch | Self::ModelMismatch => {
                "Embeddings were produced by a different model. Run `cvm precompute`"
            }
            Self::DegenerateVector => "Re-embed the affected candidate with `cvm precompute`",

            Self::DatabaseError => "Check that the database file is readable and not locked",
            Self::SerializationError => "The stored data could not be decoded; re-run the producing command",
            Self::IoError => "Check file permissions and available disk space",

            Self::LockFailed => "Another cvm process may be writing embeddings; retry shortly",

            Self::InternalError => "This is a bug; please report it with the command you ran",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::CandidateNotFound
            | Self::CandidateDuplicate
            | Self::InputInvalid
            | Self::EmbeddingsMissing
            | Self::NoCandidates
            | Self::ArtifactCorrupted
            | Self::EmbeddingFailed
            | Self::ConfigInvalid
            | Self::ConfigMissingRequired
            | Self::WeightsInvalid
            | Self::DimensionMismatch
            | Self::DegenerateVector
            | Self::ModelMismatch
            | Self::IoError
            | Self::LockFailed => true,

            Self::DatabaseError | Self::SerializationError | Self::InternalError => false,
        }
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "candidate",
            2 => "embeddings",
            3 => "config",
            4 => "ranking",
            6 => "storage",
            8 => "lock",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::CandidateNotFound,
            Self::CandidateDuplicate,
            Self::InputInvalid,
            Self::EmbeddingsMissing,
            Self::NoCandidates,
            Self::ArtifactCorrupted,
            Self::EmbeddingFailed,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::WeightsInvalid,
            Self::DimensionMismatch,
            Self::DegenerateVector,
            Self::ModelMismatch,
            Self::DatabaseError,
            Self::SerializationError,
            Self::IoError,
            Self::LockFailed,
            Self::InternalError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}

//! Error types for fotoreg core
//!
//! Validation problems are not errors: they are returned as
//! [`ValidationIssue`](crate::validation::ValidationIssue) lists. The types
//! here cover:
//! - Workflow misuse (saving before a clean preview)
//! - Failures of the spreadsheet destination
//! - Reference data and configuration loading

use crate::phase::DraftPhase;
use std::path::PathBuf;

/// Session workflow error
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Phase change not permitted by the draft lifecycle
    #[error("illegal phase transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current phase
        from: DraftPhase,
        /// Requested phase
        to: DraftPhase,
    },

    /// Preview requested while the draft is not clean
    #[error("draft has not passed validation (phase {0:?})")]
    NotValidated(DraftPhase),

    /// Save requested before the preview was shown
    #[error("save is not available in phase {0:?}")]
    SubmitUnavailable(DraftPhase),

    /// A field needed to build the row is missing
    #[error("draft is missing {0}")]
    IncompleteDraft(&'static str),

    /// The destination refused or failed the append
    #[error("spreadsheet append failed: {0}")]
    Sink(#[from] SinkError),
}

/// Failure reported by a spreadsheet destination
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// No worksheet tab with this title
    #[error("worksheet not found: {0}")]
    WorksheetNotFound(String),

    /// Credentials rejected by the service
    #[error("authentication rejected by spreadsheet service: {0}")]
    Unauthorized(String),

    /// Non-success response
    #[error("spreadsheet service returned {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Network failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Response could not be understood
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Reference data loading error
#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    /// File could not be opened or read
    #[error("cannot read vocabulary file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// CSV structure error
    #[error("invalid vocabulary csv: {0}")]
    Csv(#[from] csv::Error),

    /// Expected column absent from the header
    #[error("vocabulary is missing column {0:?}")]
    MissingColumn(&'static str),
}

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Required secret neither in the file nor in the environment
    #[error("missing secret {key} (set it in [secrets] or via {env})")]
    MissingSecret {
        /// Key under `[secrets]`
        key: &'static str,
        /// Environment override
        env: &'static str,
    },

    /// Value present but unusable
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Offending key
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

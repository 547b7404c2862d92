// ============================================================
// Layer 3 — Error Types
// ============================================================
// Typed errors for the two library boundaries callers branch on:
//
//   ModelError  — classifier / regressor lifecycle and persistence
//   TaggerError — pattern compilation and corpus access
//
// The application and CLI layers wrap these in anyhow::Error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by trainable models and their persisted blobs.
#[derive(Debug, Error)]
pub enum ModelError {
    /// predict / weights called before train or load
    #[error("model not initialized: {0} (train it or load a persisted model first)")]
    NotInitialized(String),

    /// A persisted blob does not exist
    #[error("model blob not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A persisted blob exists but cannot be decoded
    #[error("cannot deserialize '{}': {reason}", .path.display())]
    Deserialization { path: PathBuf, reason: String },

    /// A model or corpus cannot be encoded / written
    #[error("cannot serialize '{}': {reason}", .path.display())]
    Serialization { path: PathBuf, reason: String },

    /// Input width differs from the width the model was trained on.
    /// Usually means the pattern catalogue changed and a retrain is due.
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what:     String,
        expected: usize,
        found:    usize,
    },

    /// Nothing to train on
    #[error("no training examples for {0}")]
    EmptyDataset(String),

    /// Tensor data could not be read back from the backend
    #[error("backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while compiling patterns or walking the corpus.
#[derive(Debug, Error)]
pub enum TaggerError {
    #[error("invalid pattern for '{label}': {source}")]
    InvalidPattern {
        label:  String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot read pattern catalogue '{}': {reason}", .path.display())]
    InvalidCatalogue { path: PathBuf, reason: String },

    #[error("cannot read corpus directory '{}': {source}", .path.display())]
    CorpusUnreadable {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_message_names_model() {
        let e = ModelError::NotInitialized("classifier".into());
        assert!(e.to_string().contains("classifier"));
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let e = ModelError::DimensionMismatch { what: "facts".into(), expected: 3, found: 2 };
        assert_eq!(e.to_string(), "dimension mismatch for facts: expected 3, found 2");
    }
}

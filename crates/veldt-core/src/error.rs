//! Error types for map loading, saving, and structured IO.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by map persistence and the structured node IO layer.
#[derive(Debug, Error)]
pub enum MapError {
    /// The requested map file does not exist.
    #[error("map file not found: {0}")]
    FileNotFound(PathBuf),

    /// Underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON.
    #[error("malformed map file: {0}")]
    Json(#[from] serde_json::Error),

    /// A required node is absent from the document.
    #[error("missing node `{0}`")]
    MissingNode(String),

    /// A required scalar key is absent from a node.
    #[error("missing key `{0}`")]
    MissingKey(String),

    /// A key is present but holds the wrong type of value.
    #[error("key `{key}` is not a {expected}")]
    TypeMismatch {
        /// Name of the offending key.
        key: String,
        /// What the reader expected to find there.
        expected: &'static str,
    },

    /// `end_node` was called with a name that does not match the open node.
    #[error("unbalanced node: tried to close `{found}` while `{open}` is open")]
    UnbalancedNode {
        /// The node currently open.
        open: String,
        /// The name the caller tried to close.
        found: String,
    },

    /// The dynamic entity factory rejected a record.
    #[error("entity factory error: {0}")]
    Factory(String),
}

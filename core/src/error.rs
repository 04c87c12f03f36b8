//! Error types surfaced by the core. The serving layer decides how each
//! variant maps onto a transport-level response.

use crate::DocId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("index not loaded")]
    IndexUnavailable,

    /// Well-formed input that breaks the posting contract: wrong value
    /// types (negative positions, non-integer doc ids) or invariant violations.
    #[error("malformed index: {reason}")]
    MalformedIndex { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unparseable JSON (syntax errors, truncated files).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

impl SearchError {
    pub(crate) fn malformed(term: &str, doc_id: DocId, reason: impl Into<String>) -> Self {
        SearchError::MalformedIndex { reason: format!("term '{term}', doc {doc_id}: {}", reason.into()) }
    }

    /// Valid JSON that does not have the `{term: {doc_id: [positions]}}` shape.
    pub(crate) fn bad_shape(err: serde_json::Error) -> Self {
        SearchError::MalformedIndex { reason: err.to_string() }
    }

    /// True when the caller asked for a ranking before any index was installed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SearchError::IndexUnavailable)
    }
}

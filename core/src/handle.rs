use crate::error::SearchError;
use crate::index::PositionalIndex;
use crate::persist::load_index;
use crate::rank::Strategy;
use crate::{Result, ScoredDoc};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

/// Shared, swappable reference to the serving index.
///
/// Readers take an `Arc` snapshot and rank against it without holding the
/// lock. Reloading builds the replacement first and swaps the whole `Arc`,
/// so nobody ever sees a partially populated index.
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: RwLock<Option<Arc<PositionalIndex>>>,
}

impl IndexHandle {
    pub fn empty() -> Self { Self::default() }

    pub fn with_index(index: PositionalIndex) -> Self {
        Self { current: RwLock::new(Some(Arc::new(index))) }
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn snapshot(&self) -> Result<Arc<PositionalIndex>> {
        self.current.read().clone().ok_or(SearchError::IndexUnavailable)
    }

    /// Returns the index that was replaced, if any.
    pub fn install(&self, index: PositionalIndex) -> Option<Arc<PositionalIndex>> {
        let next = Arc::new(index);
        self.current.write().replace(next)
    }

    /// Load and validate a snapshot, then swap it in. On failure the
    /// current index stays in place.
    pub fn reload_from<P: AsRef<Path>>(&self, path: P) -> Result<Arc<PositionalIndex>> {
        let index = Arc::new(load_index(path)?);
        *self.current.write() = Some(Arc::clone(&index));
        tracing::info!(terms = index.term_count(), "index swapped in");
        Ok(index)
    }

    pub fn rank<S: AsRef<str>>(&self, strategy: Strategy, query_terms: &[S]) -> Result<Vec<ScoredDoc>> {
        let index = self.snapshot()?;
        Ok(strategy.rank(query_terms, &index))
    }
}

//! Nearest-chunk retrieval over the store

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::storage::{ScoredChunk, TranscriptStore};

/// Chunks retrieved per query when the caller does not say otherwise
pub const DEFAULT_TOP_K: usize = 10;

/// Retrieves the k chunks nearest to a query vector.
///
/// Results are unique by chunk ID and ordered by ascending distance; fewer
/// than `k` results (including none at all) is a valid outcome, not an
/// error. Against an unchanged store, repeated calls return identical
/// ordered results.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn TranscriptStore>,
}

impl Retriever {
    /// Create a new retriever over the given store
    pub fn new(store: Arc<dyn TranscriptStore>) -> Self {
        Self { store }
    }

    /// Retrieve up to `k` (default [`DEFAULT_TOP_K`]) nearest chunks
    pub async fn retrieve(&self, query: &[f32], k: Option<usize>) -> Result<Vec<ScoredChunk>> {
        let k = k.unwrap_or(DEFAULT_TOP_K);
        let mut results = self.store.nearest(query, k).await?;

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let mut seen = HashSet::new();
        results.retain(|result| seen.insert(result.chunk.id));
        results.truncate(k);

        tracing::debug!(requested = k, returned = results.len(), "chunks retrieved");
        Ok(results)
    }
}

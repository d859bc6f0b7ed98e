//! Embedding-batch orchestration
//!
//! Partitions texts into size-bounded batches, submits each batch to the
//! remote embedding service as one call, and reassembles the vectors in
//! the original order.

use std::ops::Range;
use std::sync::Arc;

use futures::future;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

/// Batching front-end over an [`EmbeddingProvider`].
///
/// `embed_all` is length- and order-preserving: the vector at index `i`
/// embeds `texts[i]`, regardless of how the texts were batched internally.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    /// Maximum aggregate characters per remote call
    max_batch_chars: usize,
}

impl Embedder {
    /// Create a new embedder with the given per-call character budget
    pub fn new(provider: Arc<dyn EmbeddingProvider>, max_batch_chars: usize) -> Self {
        Self {
            provider,
            max_batch_chars,
        }
    }

    /// Embed all texts, batching under the configured budget.
    ///
    /// Batches are dispatched concurrently; they are independent calls
    /// against the remote service. A batch whose returned vector count does
    /// not match its text count fails the whole operation rather than
    /// leaving the caller to zip mismatched collections.
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batches = plan_batches(texts, self.max_batch_chars);
        tracing::debug!(
            texts = texts.len(),
            batches = batches.len(),
            provider = self.provider.name(),
            "dispatching embedding batches"
        );

        let calls = batches
            .iter()
            .map(|range| self.provider.embed_batch(&texts[range.clone()]));
        let results = future::try_join_all(calls).await?;

        let mut vectors = Vec::with_capacity(texts.len());
        for (range, batch) in batches.into_iter().zip(results) {
            if batch.len() != range.len() {
                return Err(Error::Embedding(format!(
                    "embedding service returned {} vectors for a batch of {} texts",
                    batch.len(),
                    range.len()
                )));
            }
            vectors.extend(batch);
        }

        Ok(vectors)
    }

    /// Embed a single text (a batch of one)
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed_all(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("embedding service returned no vector"))
    }

    /// Embedding dimensions of the underlying provider
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }
}

/// Greedily pack `texts` into index ranges whose aggregate character count
/// stays at or under `budget`. Each batch is filled before the next one is
/// started, so the batch count is minimal for this packing. A single text
/// longer than the budget cannot be split and forms a batch of its own.
fn plan_batches(texts: &[String], budget: usize) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0usize;
    let mut size = 0usize;

    for (i, text) in texts.iter().enumerate() {
        let len = text.chars().count();
        if i > start && size + len > budget {
            batches.push(start..i);
            start = i;
            size = 0;
        }
        size += len;
    }
    if start < texts.len() {
        batches.push(start..texts.len());
    }

    batches
}

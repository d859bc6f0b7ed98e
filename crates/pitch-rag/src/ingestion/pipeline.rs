//! Ingestion pipeline: segment, embed, store
//!
//! One pipeline execution per inbound transcript. A transcript is either
//! fully retrievable after ingestion or not retrievable at all: the
//! transcript row and its chunk set are committed in one transaction, so a
//! failure at the embedding or store stage persists nothing.

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::storage::TranscriptStore;
use crate::types::{NewTranscript, Transcript};

use super::segmenter::Segmenter;

/// Composes the segmenter, embedder, and store into the ingestion flow
#[derive(Clone)]
pub struct IngestionPipeline {
    segmenter: Segmenter,
    embedder: Embedder,
    store: Arc<dyn TranscriptStore>,
}

impl IngestionPipeline {
    /// Create a new ingestion pipeline
    pub fn new(segmenter: Segmenter, embedder: Embedder, store: Arc<dyn TranscriptStore>) -> Self {
        Self {
            segmenter,
            embedder,
            store,
        }
    }

    /// Ingest one transcript: segment the text, embed every unit, and commit
    /// transcript + chunks atomically.
    ///
    /// Empty text is not an error; it yields a transcript with zero chunks.
    pub async fn ingest(&self, text: &str, metadata: NewTranscript) -> Result<Transcript> {
        let units = self.segmenter.segment(text);
        tracing::info!(chunks = units.len(), chars = text.len(), "transcript segmented");

        if units.is_empty() {
            return self
                .store
                .insert_transcript_with_chunks(metadata, text, Vec::new())
                .await;
        }

        let embeddings = self.embedder.embed_all(&units).await?;
        if embeddings.len() != units.len() {
            return Err(Error::Embedding(format!(
                "embedded {} of {} chunks; refusing to store a partial set",
                embeddings.len(),
                units.len()
            )));
        }
        tracing::info!(vectors = embeddings.len(), "transcript embedded");

        let chunks: Vec<(String, Vec<f32>)> = units.into_iter().zip(embeddings).collect();
        let transcript = self
            .store
            .insert_transcript_with_chunks(metadata, text, chunks)
            .await?;

        tracing::info!(
            transcript_id = %transcript.id,
            chunks = transcript.total_chunks,
            "transcript stored"
        );

        Ok(transcript)
    }
}

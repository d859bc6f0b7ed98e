//! Chunk store interface consumed by the pipelines

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Chunk, NewTranscript, Transcript, TranscriptPatch};

/// A retrieved chunk paired with its parent transcript and cosine distance
/// (ascending distance = more similar).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matched chunk
    pub chunk: Chunk,
    /// Parent transcript metadata
    pub transcript: Transcript,
    /// Cosine distance between the query and the chunk embedding
    pub distance: f32,
}

/// Persistent storage of transcripts and their embedded chunks.
///
/// Chunk positions always equal the chunk's index in the inserted sequence,
/// forming a dense `0..N-1` range per transcript. Writes of a chunk set are
/// atomic: a failed insert leaves no chunks behind.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Insert a transcript together with its chunks in one transaction.
    ///
    /// `chunks` pairs each chunk text with its embedding, in source order.
    /// An empty set is valid and yields a transcript with zero chunks.
    async fn insert_transcript_with_chunks(
        &self,
        metadata: NewTranscript,
        text: &str,
        chunks: Vec<(String, Vec<f32>)>,
    ) -> Result<Transcript>;

    /// Insert a chunk set for an existing transcript; all or nothing.
    async fn bulk_insert(&self, transcript_id: Uuid, chunks: Vec<(String, Vec<f32>)>)
        -> Result<()>;

    /// Return the `k` chunks nearest to `query` by cosine distance, each with
    /// its parent transcript, ordered by ascending distance. Inactive
    /// transcripts are excluded. Fewer than `k` results (or none) is not an
    /// error.
    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Delete a transcript and, cascading, all its chunks. Returns the
    /// number of chunks removed.
    async fn delete_transcript(&self, id: Uuid) -> Result<usize>;

    /// Fetch a transcript record by ID
    async fn get_transcript(&self, id: Uuid) -> Result<Option<Transcript>>;

    /// List all transcript records (metadata only, never the raw text)
    async fn list_transcripts(&self) -> Result<Vec<Transcript>>;

    /// Toggle a transcript's visibility flag
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Transcript>;

    /// Apply a partial metadata update
    async fn update_metadata(&self, id: Uuid, patch: TranscriptPatch) -> Result<Transcript>;

    /// Total number of chunks in the store
    async fn chunk_count(&self) -> Result<usize>;
}

/// Cosine distance between two vectors: `1 - cos(a, b)`, in `[0, 2]`.
///
/// A zero vector has no direction; its distance to anything is defined as 1
/// (orthogonal) so degenerate embeddings sort behind genuine matches.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let v = vec![0.5, 0.25, -1.0];
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_have_distance_two() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_distance(&a, &b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_distance_one() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_treated_as_orthogonal() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 2.0];
        assert_eq!(cosine_distance(&a, &b), 1.0);
    }
}

//! Response types for the HTTP surface

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transcript::Transcript;

/// Response from a RAG query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The question that was asked
    pub question: String,
    /// Generated answer
    pub answer: String,
    /// Number of chunks retrieved for the prompt
    pub chunks_retrieved: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Response from transcript ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// The stored transcript record
    pub transcript: Transcript,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Response from transcript deletion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// ID of the removed transcript
    pub id: Uuid,
    /// Number of chunks removed by the cascade
    pub deleted_chunks: usize,
}

/// Listing of transcript metadata (never includes the raw text)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptListResponse {
    pub transcripts: Vec<Transcript>,
    pub count: usize,
}

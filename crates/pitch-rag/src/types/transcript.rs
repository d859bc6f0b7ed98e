//! Transcript and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A transcript that has been ingested
///
/// The raw text lives in the store; this record carries the descriptive
/// metadata surfaced in listings and retrieval results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Unique transcript ID
    pub id: Uuid,
    /// Free-text title
    pub title: Option<String>,
    /// Name of the trainer or salesperson featured in the transcript
    pub trainer_name: Option<String>,
    /// Origin label (video, document, ...)
    pub media_type: Option<String>,
    /// Source reference (URL of the original recording or document)
    pub source_url: Option<String>,
    /// Whether the source link may be shown to searchers
    pub provide_source_link: bool,
    /// Visibility flag; inactive transcripts are excluded from retrieval
    pub active: bool,
    /// Number of chunks created at ingestion
    pub total_chunks: u32,
    /// Ingestion timestamp
    pub created_at: DateTime<Utc>,
    /// Last metadata update
    pub updated_at: DateTime<Utc>,
}

/// Metadata supplied when ingesting a new transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTranscript {
    pub title: Option<String>,
    pub trainer_name: Option<String>,
    pub media_type: Option<String>,
    pub source_url: Option<String>,
    #[serde(default)]
    pub provide_source_link: bool,
}

impl NewTranscript {
    /// Create metadata with just a trainer name
    pub fn with_trainer(trainer_name: impl Into<String>) -> Self {
        Self {
            trainer_name: Some(trainer_name.into()),
            ..Default::default()
        }
    }
}

/// Partial metadata update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptPatch {
    pub title: Option<String>,
    pub trainer_name: Option<String>,
    pub media_type: Option<String>,
    pub source_url: Option<String>,
    pub provide_source_link: Option<bool>,
}

impl TranscriptPatch {
    /// Returns `true` when no field is set
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.trainer_name.is_none()
            && self.media_type.is_none()
            && self.source_url.is_none()
            && self.provide_source_link.is_none()
    }
}

/// A chunk of text from a transcript
///
/// Chunks are created only during ingestion of their parent transcript and
/// are never mutated afterwards; they are deleted only when the parent is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent transcript ID
    pub transcript_id: Uuid,
    /// Zero-based sequence index within the parent; dense 0..N-1 per transcript
    pub position: u32,
    /// Text content; never empty
    pub text: String,
    /// Embedding vector; dimension is uniform across the whole store
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(transcript_id: Uuid, position: u32, text: String, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript_id,
            position,
            text,
            embedding,
        }
    }
}

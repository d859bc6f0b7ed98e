//! Request types for the HTTP surface

use serde::{Deserialize, Serialize};

use super::transcript::NewTranscript;

/// Query request for RAG search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (default: 10)
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    10
}

impl QueryRequest {
    /// Create a new query with the default top-k
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: default_top_k(),
        }
    }

    /// Set the number of chunks to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }
}

/// Ingest request: already-extracted plain text plus descriptive metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Plain transcript text
    pub text: String,

    /// Free-text title
    #[serde(default)]
    pub title: Option<String>,

    /// Trainer or salesperson name
    #[serde(default)]
    pub trainer_name: Option<String>,

    /// Origin label (video, document, ...)
    #[serde(default)]
    pub media_type: Option<String>,

    /// Source reference
    #[serde(default)]
    pub source_url: Option<String>,

    /// Whether the source link may be shown to searchers
    #[serde(default)]
    pub provide_source_link: bool,
}

impl From<&IngestRequest> for NewTranscript {
    fn from(request: &IngestRequest) -> Self {
        Self {
            title: request.title.clone(),
            trainer_name: request.trainer_name.clone(),
            media_type: request.media_type.clone(),
            source_url: request.source_url.clone(),
            provide_source_link: request.provide_source_link,
        }
    }
}

/// Request body for toggling a transcript's visibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleActiveRequest {
    pub active: bool,
}

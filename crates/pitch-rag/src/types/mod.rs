//! Core data types

pub mod query;
pub mod response;
pub mod transcript;

pub use query::{IngestRequest, QueryRequest, ToggleActiveRequest};
pub use response::{DeleteResponse, IngestResponse, QueryResponse, TranscriptListResponse};
pub use transcript::{Chunk, NewTranscript, Transcript, TranscriptPatch};

//! pitch-rag: Transcript RAG service with semantic chunking and vector retrieval
//!
//! This crate ingests sales-training transcripts, splits them into overlapping
//! chunks, embeds each chunk via a remote embedding service, and answers
//! questions by retrieving the nearest chunks and prompting a completion
//! service with them.

pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod query;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    query::{IngestRequest, QueryRequest},
    response::{IngestResponse, QueryResponse},
    transcript::{Chunk, NewTranscript, Transcript},
};

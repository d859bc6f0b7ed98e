//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::ingestion::{IngestionPipeline, Segmenter};
use crate::providers::{CompletionProvider, EmbeddingProvider, OpenAiProvider};
use crate::query::QueryPipeline;
use crate::retrieval::Retriever;
use crate::storage::{SqliteStore, TranscriptStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Transcript + chunk store
    store: Arc<dyn TranscriptStore>,
    /// Ingestion pipeline (segment -> embed -> store)
    ingestion: IngestionPipeline,
    /// Query pipeline (embed -> retrieve -> prompt -> complete)
    query: QueryPipeline,
}

impl AppState {
    /// Create application state with the configured SQLite store and
    /// OpenAI-compatible remote providers.
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing RAG application state...");

        let store: Arc<dyn TranscriptStore> = Arc::new(SqliteStore::new(
            &config.storage.db_path,
            config.embeddings.dimensions,
        )?);
        tracing::info!(db = %config.storage.db_path.display(), "store initialized");

        let (embedder, completion) = OpenAiProvider::new(&config.llm, &config.embeddings)?.split();
        Self::with_providers(config, store, Arc::new(embedder), Arc::new(completion))
    }

    /// Create application state from explicit collaborators. This is the
    /// seam tests use to substitute fake services and an in-memory store.
    pub fn with_providers(
        config: RagConfig,
        store: Arc<dyn TranscriptStore>,
        embedding: Arc<dyn EmbeddingProvider>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let segmenter = Segmenter::from_config(&config.segmenter)?;
        let embedder = Embedder::new(embedding, config.embeddings.max_batch_chars);

        let ingestion =
            IngestionPipeline::new(segmenter, embedder.clone(), Arc::clone(&store));
        let query = QueryPipeline::new(embedder, Retriever::new(Arc::clone(&store)), completion);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                ingestion,
                query,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the transcript store
    pub fn store(&self) -> &Arc<dyn TranscriptStore> {
        &self.inner.store
    }

    /// Get the ingestion pipeline
    pub fn ingestion(&self) -> &IngestionPipeline {
        &self.inner.ingestion
    }

    /// Get the query pipeline
    pub fn query(&self) -> &QueryPipeline {
        &self.inner.query
    }
}

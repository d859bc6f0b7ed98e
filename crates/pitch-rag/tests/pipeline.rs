//! End-to-end pipeline tests
//!
//! Remote embedding and completion services are replaced with deterministic
//! fakes; storage is an in-memory SQLite database. Each test drives the same
//! pipeline objects the server assembles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use pitch_rag::config::SegmenterConfig;
use pitch_rag::embedding::Embedder;
use pitch_rag::error::{Error, Result};
use pitch_rag::ingestion::{IngestionPipeline, Segmenter};
use pitch_rag::providers::{CompletionProvider, EmbeddingProvider};
use pitch_rag::query::QueryPipeline;
use pitch_rag::retrieval::Retriever;
use pitch_rag::storage::{SqliteStore, TranscriptStore};
use pitch_rag::types::NewTranscript;

const DIMENSIONS: usize = 4;

/// Deterministic direction derived from the text's bytes.
fn fake_vector(text: &str) -> Vec<f32> {
    let mut v = vec![1.0f32; DIMENSIONS];
    for (i, b) in text.bytes().enumerate() {
        v[i % DIMENSIONS] += b as f32;
    }
    v
}

struct FakeEmbedding;

#[async_trait]
impl EmbeddingProvider for FakeEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| fake_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// First call succeeds, every later call fails, simulating an outage that
/// starts mid-ingestion.
struct FlakyEmbedding {
    calls: AtomicUsize,
}

impl FlakyEmbedding {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(Error::embedding("embedding service unavailable"));
        }
        Ok(texts.iter().map(|t| fake_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Returns one vector fewer than requested, like the silent-failure mode of
/// a misbehaving remote service.
struct ShortChangedEmbedding;

#[async_trait]
impl EmbeddingProvider for ShortChangedEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|t| fake_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "short-changed"
    }
}

struct FailingEmbedding;

#[async_trait]
impl EmbeddingProvider for FailingEmbedding {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::embedding("embedding service unreachable"))
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Records the prompt it was handed and returns a canned answer.
struct CapturingCompletion {
    prompts: Mutex<Vec<String>>,
}

impl CapturingCompletion {
    fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionProvider for CapturingCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        Ok("Lead with discovery questions.".to_string())
    }

    fn model(&self) -> &str {
        "canned"
    }

    fn name(&self) -> &str {
        "capturing"
    }
}

struct FailingCompletion;

#[async_trait]
impl CompletionProvider for FailingCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(Error::completion("completion service unreachable"))
    }

    fn model(&self) -> &str {
        "canned"
    }

    fn name(&self) -> &str {
        "failing"
    }
}

struct Harness {
    ingestion: IngestionPipeline,
    query: QueryPipeline,
    store: Arc<SqliteStore>,
    completion: Arc<CapturingCompletion>,
}

fn harness_with(
    embedding: Arc<dyn EmbeddingProvider>,
    max_size: usize,
    overlap: usize,
    max_batch_chars: usize,
) -> Harness {
    let store = Arc::new(SqliteStore::in_memory(DIMENSIONS).unwrap());
    let segmenter = Segmenter::from_config(&SegmenterConfig {
        max_size,
        overlap,
        ..Default::default()
    })
    .unwrap();
    let embedder = Embedder::new(embedding, max_batch_chars);
    let completion = Arc::new(CapturingCompletion::new());

    let ingestion = IngestionPipeline::new(
        segmenter,
        embedder.clone(),
        store.clone() as Arc<dyn TranscriptStore>,
    );
    let query = QueryPipeline::new(
        embedder,
        Retriever::new(store.clone() as Arc<dyn TranscriptStore>),
        completion.clone() as Arc<dyn CompletionProvider>,
    );

    Harness {
        ingestion,
        query,
        store,
        completion,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(FakeEmbedding), 1000, 200, 7000)
}

#[tokio::test]
async fn ingestion_stores_one_chunk_per_unit() {
    let h = harness_with(Arc::new(FakeEmbedding), 1000, 200, 7000);

    // Marker-free text hard-cuts into 3 units: 1000, then 800 fresh + 200
    // overlap twice over.
    let text = "a".repeat(2500);
    let transcript = h
        .ingestion
        .ingest(&text, NewTranscript::with_trainer("Jordan"))
        .await
        .unwrap();

    assert_eq!(transcript.total_chunks, 3);
    assert_eq!(h.store.chunk_count().await.unwrap(), 3);

    let mut results = h.store.nearest(&fake_vector("a"), 10).await.unwrap();
    results.sort_by_key(|r| r.chunk.position);
    let positions: Vec<u32> = results.iter().map(|r| r.chunk.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[tokio::test]
async fn empty_text_ingests_a_transcript_with_zero_chunks() {
    let h = harness();

    let transcript = h
        .ingestion
        .ingest("", NewTranscript::default())
        .await
        .unwrap();

    assert_eq!(transcript.total_chunks, 0);
    assert_eq!(h.store.chunk_count().await.unwrap(), 0);

    let listed = h.store.list_transcripts().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, transcript.id);
}

#[tokio::test]
async fn failed_embedding_batch_persists_nothing() {
    // Small budgets force one batch per unit, so the flaky provider fails
    // from the second batch on.
    let h = harness_with(Arc::new(FlakyEmbedding::new()), 40, 0, 40);

    let text = "One sentence here. Another sentence there. A third one closes. And a fourth follows.";
    let result = h.ingestion.ingest(text, NewTranscript::default()).await;

    assert!(matches!(result, Err(Error::Embedding(_))));
    assert_eq!(h.store.chunk_count().await.unwrap(), 0);
    assert!(h.store.list_transcripts().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_vectors_fail_ingestion_instead_of_dropping_chunks() {
    let h = harness_with(Arc::new(ShortChangedEmbedding), 40, 0, 7000);

    let text = "First sentence of the pitch. Second sentence of the pitch. Third one wraps up.";
    let result = h.ingestion.ingest(text, NewTranscript::default()).await;

    assert!(matches!(result, Err(Error::Embedding(_))));
    assert_eq!(h.store.chunk_count().await.unwrap(), 0);
}

#[tokio::test]
async fn query_builds_prompt_from_stored_chunks() {
    let h = harness();

    h.ingestion
        .ingest(
            "Always open with a question about the prospect's goals.",
            NewTranscript::with_trainer("Jordan"),
        )
        .await
        .unwrap();

    let (answer, chunks_retrieved) = h
        .query
        .answer_with_stats("How should I open a call?", None)
        .await
        .unwrap();

    assert_eq!(answer, "Lead with discovery questions.");
    assert_eq!(chunks_retrieved, 1);

    let prompt = h.completion.last_prompt();
    assert!(prompt.contains("The question is: How should I open a call?"));
    assert!(prompt.contains("Trainer: Jordan"));
    assert!(prompt.contains("Always open with a question about the prospect's goals."));
}

#[tokio::test]
async fn retrieval_caps_at_store_population() {
    let h = harness_with(Arc::new(FakeEmbedding), 40, 0, 7000);

    h.ingestion
        .ingest(
            "Ask open questions. Listen more than you talk. Summarize before closing.",
            NewTranscript::default(),
        )
        .await
        .unwrap();
    assert_eq!(h.store.chunk_count().await.unwrap(), 3);

    // k far beyond the population is not an error.
    let (_, chunks_retrieved) = h
        .query
        .answer_with_stats("How do I run a call?", Some(10))
        .await
        .unwrap();
    assert_eq!(chunks_retrieved, 3);
}

#[tokio::test]
async fn question_embedding_failure_surfaces_as_embedding_error() {
    let store = Arc::new(SqliteStore::in_memory(DIMENSIONS).unwrap());
    let embedder = Embedder::new(Arc::new(FailingEmbedding), 7000);
    let query = QueryPipeline::new(
        embedder,
        Retriever::new(store as Arc<dyn TranscriptStore>),
        Arc::new(CapturingCompletion::new()),
    );

    let result = query.answer("unanswerable", None).await;
    assert!(matches!(result, Err(Error::Embedding(_))));
}

#[tokio::test]
async fn completion_failure_surfaces_as_completion_error() {
    let store = Arc::new(SqliteStore::in_memory(DIMENSIONS).unwrap());
    let embedder = Embedder::new(Arc::new(FakeEmbedding), 7000);
    let query = QueryPipeline::new(
        embedder,
        Retriever::new(store as Arc<dyn TranscriptStore>),
        Arc::new(FailingCompletion),
    );

    let result = query.answer("doomed question", None).await;
    assert!(matches!(result, Err(Error::Completion(_))));
}

#[tokio::test]
async fn deleting_a_transcript_removes_it_from_retrieval() {
    let h = harness();

    let transcript = h
        .ingestion
        .ingest(
            "Handle the pricing objection by returning to value.",
            NewTranscript::default(),
        )
        .await
        .unwrap();

    let deleted = h.store.delete_transcript(transcript.id).await.unwrap();
    assert_eq!(deleted, 1);

    let (_, chunks_retrieved) = h
        .query
        .answer_with_stats("What about pricing?", None)
        .await
        .unwrap();
    assert_eq!(chunks_retrieved, 0);
}

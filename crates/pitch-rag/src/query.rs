//! Query orchestration: embed the question, retrieve, prompt, complete

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::providers::CompletionProvider;
use crate::retrieval::Retriever;

/// Top-level query entry point.
///
/// Every stage is a suspension point; a failure at any stage surfaces as
/// the matching error variant rather than a degraded or empty answer, since
/// an empty answer would be indistinguishable from "no relevant content".
#[derive(Clone)]
pub struct QueryPipeline {
    embedder: Embedder,
    retriever: Retriever,
    completion: Arc<dyn CompletionProvider>,
}

impl QueryPipeline {
    /// Create a new query pipeline
    pub fn new(
        embedder: Embedder,
        retriever: Retriever,
        completion: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            embedder,
            retriever,
            completion,
        }
    }

    /// Answer a question against the stored transcripts, retrieving up to
    /// `top_k` chunks (the retriever's default when `None`).
    pub async fn answer(&self, question: &str, top_k: Option<usize>) -> Result<String> {
        self.answer_with_stats(question, top_k)
            .await
            .map(|(answer, _)| answer)
    }

    /// Answer a question and also report how many chunks backed the prompt
    pub async fn answer_with_stats(
        &self,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<(String, usize)> {
        let query_embedding = self.embedder.embed_one(question).await?;

        let results = self.retriever.retrieve(&query_embedding, top_k).await?;
        tracing::info!(chunks = results.len(), "retrieved context for question");

        let prompt = PromptBuilder::build(question, &results);
        let answer = self.completion.complete(&prompt).await?;
        Ok((answer, results.len()))
    }
}

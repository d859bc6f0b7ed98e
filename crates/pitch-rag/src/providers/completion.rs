//! Completion provider trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Interface to an opaque text-completion service: one prompt in, one
/// answer out. No structured output is assumed beyond plain text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for the given prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model name for logging
    fn model(&self) -> &str;

    /// Provider name for logging
    fn name(&self) -> &str;
}

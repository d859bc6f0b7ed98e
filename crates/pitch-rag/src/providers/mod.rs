//! Service-client interfaces consumed by the pipelines
//!
//! The pipelines only ever see these traits; concrete clients are injected
//! when the application state is assembled, which keeps remote services
//! substitutable in tests.

pub mod completion;
pub mod embedding;
pub mod openai;

pub use completion::CompletionProvider;
pub use embedding::EmbeddingProvider;
pub use openai::{OpenAiClient, OpenAiCompletion, OpenAiEmbedder, OpenAiProvider};

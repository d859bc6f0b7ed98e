//! RAG Server binary
//!
//! Run with: cargo run -p pitch-rag --bin pitch-rag-server

use pitch_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitch_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("PITCH_RAG_CONFIG").unwrap_or_else(|_| "pitch-rag.toml".to_string());
    let config = RagConfig::load(&config_path)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - Completion model: {}", config.llm.completion_model);
    tracing::info!(
        "  - Chunk size: {} ({} overlap)",
        config.segmenter.max_size,
        config.segmenter.overlap
    );
    tracing::info!("  - Database: {}", config.storage.db_path.display());

    if config.llm.api_key.is_none() {
        tracing::warn!("No API key configured; remote embedding and completion calls will fail");
        tracing::warn!("Set OPENAI_API_KEY or llm.api_key in {}", config_path);
    }

    // Create and start server
    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/transcripts             - Ingest a transcript");
    println!("  GET    /api/transcripts/metadata    - List transcript metadata");
    println!("  PATCH  /api/transcripts/:id         - Edit metadata");
    println!("  PATCH  /api/transcripts/:id/active  - Toggle visibility");
    println!("  DELETE /api/transcripts/:id         - Delete a transcript");
    println!("  POST   /api/query                   - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}

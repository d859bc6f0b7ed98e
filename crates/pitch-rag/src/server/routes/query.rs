//! Query endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/query - Answer a question against the stored transcripts
pub async fn query_transcripts(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();

    tracing::info!("Query: \"{}\"", request.question);

    let (answer, chunks_retrieved) = state
        .query()
        .answer_with_stats(&request.question, Some(request.top_k))
        .await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        chunks_retrieved,
        "query completed in {}ms",
        processing_time_ms
    );

    Ok(Json(QueryResponse {
        question: request.question,
        answer,
        chunks_retrieved,
        processing_time_ms,
    }))
}

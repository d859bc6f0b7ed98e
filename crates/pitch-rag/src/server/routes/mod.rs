//! API route definitions

pub mod query;
pub mod transcripts;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use super::state::AppState;

/// Build the /api router
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/transcripts", post(transcripts::ingest_transcript))
        .route("/transcripts/metadata", get(transcripts::list_metadata))
        .route("/transcripts/:id", patch(transcripts::update_metadata))
        .route("/transcripts/:id", delete(transcripts::delete_transcript))
        .route("/transcripts/:id/active", patch(transcripts::toggle_active))
        .route("/query", post(query::query_transcripts))
}

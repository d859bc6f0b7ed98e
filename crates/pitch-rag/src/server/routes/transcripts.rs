//! Transcript ingestion and registry endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use std::time::Instant;
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{
    DeleteResponse, IngestRequest, IngestResponse, ToggleActiveRequest, Transcript,
    TranscriptListResponse, TranscriptPatch,
};

/// POST /api/transcripts - Ingest a transcript
pub async fn ingest_transcript(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>> {
    let start = Instant::now();

    tracing::info!(
        chars = request.text.len(),
        trainer = request.trainer_name.as_deref().unwrap_or("-"),
        "ingesting transcript"
    );

    let transcript = state
        .ingestion()
        .ingest(&request.text, (&request).into())
        .await?;

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        transcript_id = %transcript.id,
        chunks = transcript.total_chunks,
        "ingestion completed in {}ms",
        processing_time_ms
    );

    Ok(Json(IngestResponse {
        transcript,
        processing_time_ms,
    }))
}

/// GET /api/transcripts/metadata - List transcript metadata (no body text)
pub async fn list_metadata(State(state): State<AppState>) -> Result<Json<TranscriptListResponse>> {
    let transcripts = state.store().list_transcripts().await?;
    let count = transcripts.len();

    Ok(Json(TranscriptListResponse { transcripts, count }))
}

/// PATCH /api/transcripts/{id}/active - Toggle visibility
pub async fn toggle_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ToggleActiveRequest>,
) -> Result<Json<Transcript>> {
    let transcript = state.store().set_active(id, request.active).await?;

    tracing::info!(
        transcript_id = %id,
        active = request.active,
        "transcript visibility updated"
    );

    Ok(Json(transcript))
}

/// PATCH /api/transcripts/{id} - Edit metadata
pub async fn update_metadata(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TranscriptPatch>,
) -> Result<Json<Transcript>> {
    let transcript = state.store().update_metadata(id, patch).await?;
    Ok(Json(transcript))
}

/// DELETE /api/transcripts/{id} - Delete a transcript and its chunks
pub async fn delete_transcript(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    let deleted_chunks = state.store().delete_transcript(id).await?;

    tracing::info!(
        transcript_id = %id,
        deleted_chunks,
        "transcript deleted"
    );

    Ok(Json(DeleteResponse { id, deleted_chunks }))
}

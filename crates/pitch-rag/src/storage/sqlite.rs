//! SQLite-backed transcript store
//!
//! Embeddings are stored as little-endian f32 BLOBs alongside the chunk
//! text. Nearest-neighbor lookup loads the candidate vectors and ranks them
//! in-process by cosine distance, which is the sanctioned fallback for the
//! dataset sizes this service handles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, NewTranscript, Transcript, TranscriptPatch};

use super::store::{cosine_distance, ScoredChunk, TranscriptStore};

/// SQLite transcript + chunk store
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    /// Embedding dimension enforced on every write
    dimensions: usize,
}

impl SqliteStore {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P, dimensions: usize) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Store(format!("Failed to open database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            dimensions,
        };

        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory database (tests and local experiments)
    pub fn in_memory(dimensions: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Store(format!("Failed to open in-memory database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            dimensions,
        };

        store.migrate()?;
        Ok(store)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        "#,
        )
        .map_err(|e| Error::Store(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS transcripts (
                id TEXT PRIMARY KEY,
                title TEXT,
                trainer_name TEXT,
                media_type TEXT,
                source_url TEXT,
                provide_source_link INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                total_chunks INTEGER NOT NULL DEFAULT 0,
                transcript_text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                transcript_id TEXT NOT NULL REFERENCES transcripts(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                UNIQUE(transcript_id, position)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_transcript_id ON chunks(transcript_id);
        "#,
        )
        .map_err(|e| Error::Store(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    fn check_dimensions(&self, chunks: &[(String, Vec<f32>)]) -> Result<()> {
        for (text, embedding) in chunks {
            if text.is_empty() {
                return Err(Error::store("chunk text must not be empty"));
            }
            if embedding.len() != self.dimensions {
                return Err(Error::Store(format!(
                    "embedding dimension {} does not match store dimension {}",
                    embedding.len(),
                    self.dimensions
                )));
            }
        }
        Ok(())
    }

    /// Insert chunk rows inside an open transaction
    fn insert_chunk_rows(
        tx: &rusqlite::Transaction<'_>,
        transcript_id: Uuid,
        chunks: &[(String, Vec<f32>)],
    ) -> Result<()> {
        let mut stmt = tx
            .prepare(
                "INSERT INTO chunks (id, transcript_id, position, content, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(|e| Error::Store(format!("Failed to prepare insert: {}", e)))?;

        for (position, (content, embedding)) in chunks.iter().enumerate() {
            stmt.execute(params![
                Uuid::new_v4().to_string(),
                transcript_id.to_string(),
                position as i64,
                content,
                embedding_to_blob(embedding),
            ])
            .map_err(|e| Error::Store(format!("Failed to insert chunk: {}", e)))?;
        }

        Ok(())
    }

    fn get_transcript_sync(&self, id: Uuid) -> Result<Option<Transcript>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM transcripts WHERE id = ?1",
                TRANSCRIPT_COLUMNS
            ))
            .map_err(|e| Error::Store(format!("Failed to prepare query: {}", e)))?;

        let transcript = stmt
            .query_row(params![id.to_string()], row_to_transcript)
            .optional()
            .map_err(|e| Error::Store(format!("Failed to get transcript: {}", e)))?;

        Ok(transcript)
    }
}

const TRANSCRIPT_COLUMNS: &str = "id, title, trainer_name, media_type, source_url, \
     provide_source_link, active, total_chunks, created_at, updated_at";

#[async_trait]
impl TranscriptStore for SqliteStore {
    async fn insert_transcript_with_chunks(
        &self,
        metadata: NewTranscript,
        text: &str,
        chunks: Vec<(String, Vec<f32>)>,
    ) -> Result<Transcript> {
        self.check_dimensions(&chunks)?;

        let now = Utc::now();
        let transcript = Transcript {
            id: Uuid::new_v4(),
            title: metadata.title,
            trainer_name: metadata.trainer_name,
            media_type: metadata.media_type,
            source_url: metadata.source_url,
            provide_source_link: metadata.provide_source_link,
            active: true,
            total_chunks: chunks.len() as u32,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Store(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            r#"
            INSERT INTO transcripts (
                id, title, trainer_name, media_type, source_url,
                provide_source_link, active, total_chunks, transcript_text,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                transcript.id.to_string(),
                transcript.title,
                transcript.trainer_name,
                transcript.media_type,
                transcript.source_url,
                transcript.provide_source_link,
                transcript.active,
                transcript.total_chunks as i64,
                text,
                transcript.created_at.to_rfc3339(),
                transcript.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Store(format!("Failed to insert transcript: {}", e)))?;

        Self::insert_chunk_rows(&tx, transcript.id, &chunks)?;

        tx.commit()
            .map_err(|e| Error::Store(format!("Failed to commit transaction: {}", e)))?;

        Ok(transcript)
    }

    async fn bulk_insert(
        &self,
        transcript_id: Uuid,
        chunks: Vec<(String, Vec<f32>)>,
    ) -> Result<()> {
        self.check_dimensions(&chunks)?;

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Store(format!("Failed to begin transaction: {}", e)))?;

        let exists: bool = tx
            .query_row(
                "SELECT COUNT(*) FROM transcripts WHERE id = ?1",
                params![transcript_id.to_string()],
                |row| row.get::<_, i64>(0).map(|c| c > 0),
            )
            .map_err(|e| Error::Store(format!("Failed to check transcript: {}", e)))?;
        if !exists {
            return Err(Error::TranscriptNotFound(transcript_id.to_string()));
        }

        Self::insert_chunk_rows(&tx, transcript_id, &chunks)?;

        tx.execute(
            "UPDATE transcripts SET total_chunks = \
             (SELECT COUNT(*) FROM chunks WHERE transcript_id = ?1) WHERE id = ?1",
            params![transcript_id.to_string()],
        )
        .map_err(|e| Error::Store(format!("Failed to update chunk count: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::Store(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimensions {
            return Err(Error::Store(format!(
                "query dimension {} does not match store dimension {}",
                query.len(),
                self.dimensions
            )));
        }

        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT c.id, c.transcript_id, c.position, c.content, c.embedding, {} \
                 FROM chunks c JOIN transcripts t ON t.id = c.transcript_id \
                 WHERE t.active = 1",
                TRANSCRIPT_COLUMNS
                    .split(", ")
                    .map(|col| format!("t.{}", col))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .map_err(|e| Error::Store(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let chunk_id: String = row.get(0)?;
                let transcript_id: String = row.get(1)?;
                let position: i64 = row.get(2)?;
                let content: String = row.get(3)?;
                let blob: Vec<u8> = row.get(4)?;

                let transcript = transcript_from_row_offset(row, 5)?;

                Ok((chunk_id, transcript_id, position, content, blob, transcript))
            })
            .map_err(|e| Error::Store(format!("Failed to query chunks: {}", e)))?;

        let mut scored = Vec::new();
        for row in rows {
            let (chunk_id, transcript_id, position, content, blob, transcript) =
                row.map_err(|e| Error::Store(format!("Failed to read chunk row: {}", e)))?;

            let embedding = blob_to_embedding(&blob);
            if embedding.len() != self.dimensions {
                return Err(Error::Store(format!(
                    "store is corrupt: chunk {} has dimension {} (expected {})",
                    chunk_id,
                    embedding.len(),
                    self.dimensions
                )));
            }

            let distance = cosine_distance(query, &embedding);
            let chunk = Chunk {
                id: parse_uuid(&chunk_id)?,
                transcript_id: parse_uuid(&transcript_id)?,
                position: position as u32,
                text: content,
                embedding,
            };

            scored.push(ScoredChunk {
                chunk,
                transcript,
                distance,
            });
        }

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);

        Ok(scored)
    }

    async fn delete_transcript(&self, id: Uuid) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Store(format!("Failed to begin transaction: {}", e)))?;

        let deleted_chunks = tx
            .execute(
                "DELETE FROM chunks WHERE transcript_id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| Error::Store(format!("Failed to delete chunks: {}", e)))?;

        let deleted = tx
            .execute(
                "DELETE FROM transcripts WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| Error::Store(format!("Failed to delete transcript: {}", e)))?;

        if deleted == 0 {
            return Err(Error::TranscriptNotFound(id.to_string()));
        }

        tx.commit()
            .map_err(|e| Error::Store(format!("Failed to commit transaction: {}", e)))?;

        Ok(deleted_chunks)
    }

    async fn get_transcript(&self, id: Uuid) -> Result<Option<Transcript>> {
        self.get_transcript_sync(id)
    }

    async fn list_transcripts(&self) -> Result<Vec<Transcript>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM transcripts ORDER BY created_at DESC",
                TRANSCRIPT_COLUMNS
            ))
            .map_err(|e| Error::Store(format!("Failed to prepare query: {}", e)))?;

        let transcripts = stmt
            .query_map([], row_to_transcript)
            .map_err(|e| Error::Store(format!("Failed to list transcripts: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(transcripts)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<Transcript> {
        {
            let conn = self.conn.lock();
            let updated = conn
                .execute(
                    "UPDATE transcripts SET active = ?2, updated_at = ?3 WHERE id = ?1",
                    params![id.to_string(), active, Utc::now().to_rfc3339()],
                )
                .map_err(|e| Error::Store(format!("Failed to update transcript: {}", e)))?;

            if updated == 0 {
                return Err(Error::TranscriptNotFound(id.to_string()));
            }
        }

        self.get_transcript_sync(id)?
            .ok_or_else(|| Error::TranscriptNotFound(id.to_string()))
    }

    async fn update_metadata(&self, id: Uuid, patch: TranscriptPatch) -> Result<Transcript> {
        if !patch.is_empty() {
            let conn = self.conn.lock();
            let updated = conn
                .execute(
                    r#"
                    UPDATE transcripts SET
                        title = COALESCE(?2, title),
                        trainer_name = COALESCE(?3, trainer_name),
                        media_type = COALESCE(?4, media_type),
                        source_url = COALESCE(?5, source_url),
                        provide_source_link = COALESCE(?6, provide_source_link),
                        updated_at = ?7
                    WHERE id = ?1
                    "#,
                    params![
                        id.to_string(),
                        patch.title,
                        patch.trainer_name,
                        patch.media_type,
                        patch.source_url,
                        patch.provide_source_link,
                        Utc::now().to_rfc3339(),
                    ],
                )
                .map_err(|e| Error::Store(format!("Failed to update transcript: {}", e)))?;

            if updated == 0 {
                return Err(Error::TranscriptNotFound(id.to_string()));
            }
        }

        self.get_transcript_sync(id)?
            .ok_or_else(|| Error::TranscriptNotFound(id.to_string()))
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| Error::Store(format!("Failed to count chunks: {}", e)))?;

        Ok(count as usize)
    }
}

// Helper functions

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Store(format!("Invalid UUID in store: {}", e)))
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_transcript(row: &rusqlite::Row) -> rusqlite::Result<Transcript> {
    transcript_from_row_offset(row, 0)
}

fn transcript_from_row_offset(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<Transcript> {
    let id_str: String = row.get(offset)?;
    let title: Option<String> = row.get(offset + 1)?;
    let trainer_name: Option<String> = row.get(offset + 2)?;
    let media_type: Option<String> = row.get(offset + 3)?;
    let source_url: Option<String> = row.get(offset + 4)?;
    let provide_source_link: bool = row.get(offset + 5)?;
    let active: bool = row.get(offset + 6)?;
    let total_chunks: i64 = row.get(offset + 7)?;
    let created_at_str: String = row.get(offset + 8)?;
    let updated_at_str: String = row.get(offset + 9)?;

    Ok(Transcript {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
        title,
        trainer_name,
        media_type,
        source_url,
        provide_source_link,
        active,
        total_chunks: total_chunks as u32,
        created_at: parse_timestamp(&created_at_str),
        updated_at: parse_timestamp(&updated_at_str),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    fn store() -> SqliteStore {
        SqliteStore::in_memory(3).unwrap()
    }

    fn chunk(text: &str, embedding: Vec<f32>) -> (String, Vec<f32>) {
        (text.to_string(), embedding)
    }

    #[test]
    fn embedding_blob_roundtrip() {
        let embedding = vec![0.1, -2.5, 1e-8, 42.0];
        assert_eq!(blob_to_embedding(&embedding_to_blob(&embedding)), embedding);
    }

    #[test]
    fn nearest_returns_ascending_distances_capped_at_store_size() {
        let store = store();
        let transcript = block_on(store.insert_transcript_with_chunks(
            NewTranscript::with_trainer("Jordan"),
            "full text",
            vec![
                chunk("closest", vec![1.0, 0.0, 0.0]),
                chunk("near", vec![0.7, 0.7, 0.0]),
                chunk("far", vec![-1.0, 0.0, 0.0]),
            ],
        ))
        .unwrap();

        // k larger than the store population is not an error.
        let results = block_on(store.nearest(&[1.0, 0.0, 0.0], 10)).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.text, "closest");
        assert_eq!(results[1].chunk.text, "near");
        assert_eq!(results[2].chunk.text, "far");
        assert!(results[0].distance <= results[1].distance);
        assert!(results[1].distance <= results[2].distance);
        assert_eq!(results[0].transcript.id, transcript.id);
        assert_eq!(results[0].transcript.trainer_name.as_deref(), Some("Jordan"));
    }

    #[test]
    fn positions_are_dense_and_ordered() {
        let store = store();
        let transcript = block_on(store.insert_transcript_with_chunks(
            NewTranscript::default(),
            "text",
            vec![
                chunk("first", vec![1.0, 0.0, 0.0]),
                chunk("second", vec![0.0, 1.0, 0.0]),
                chunk("third", vec![0.0, 0.0, 1.0]),
            ],
        ))
        .unwrap();
        assert_eq!(transcript.total_chunks, 3);

        let mut results = block_on(store.nearest(&[1.0, 1.0, 1.0], 10)).unwrap();
        results.sort_by_key(|r| r.chunk.position);
        let positions: Vec<u32> = results.iter().map(|r| r.chunk.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(results[0].chunk.text, "first");
    }

    #[test]
    fn inactive_transcripts_are_excluded_from_retrieval() {
        let store = store();
        let transcript = block_on(store.insert_transcript_with_chunks(
            NewTranscript::default(),
            "text",
            vec![chunk("hidden soon", vec![1.0, 0.0, 0.0])],
        ))
        .unwrap();

        assert_eq!(block_on(store.nearest(&[1.0, 0.0, 0.0], 10)).unwrap().len(), 1);

        let updated = block_on(store.set_active(transcript.id, false)).unwrap();
        assert!(!updated.active);
        assert!(block_on(store.nearest(&[1.0, 0.0, 0.0], 10)).unwrap().is_empty());
    }

    #[test]
    fn delete_cascades_and_reports_chunk_count() {
        let store = store();
        let transcript = block_on(store.insert_transcript_with_chunks(
            NewTranscript::default(),
            "text",
            vec![
                chunk("one", vec![1.0, 0.0, 0.0]),
                chunk("two", vec![0.0, 1.0, 0.0]),
            ],
        ))
        .unwrap();

        let deleted = block_on(store.delete_transcript(transcript.id)).unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(block_on(store.chunk_count()).unwrap(), 0);
        assert!(block_on(store.get_transcript(transcript.id)).unwrap().is_none());
    }

    #[test]
    fn delete_of_unknown_transcript_is_not_found() {
        let store = store();
        let result = block_on(store.delete_transcript(Uuid::new_v4()));
        assert!(matches!(result, Err(Error::TranscriptNotFound(_))));
    }

    #[test]
    fn mismatched_dimension_is_rejected() {
        let store = store();
        let result = block_on(store.insert_transcript_with_chunks(
            NewTranscript::default(),
            "text",
            vec![chunk("bad", vec![1.0, 0.0])],
        ));
        assert!(matches!(result, Err(Error::Store(_))));
        assert_eq!(block_on(store.chunk_count()).unwrap(), 0);
    }

    #[test]
    fn bulk_insert_requires_existing_transcript() {
        let store = store();
        let result = block_on(store.bulk_insert(
            Uuid::new_v4(),
            vec![chunk("orphan", vec![1.0, 0.0, 0.0])],
        ));
        assert!(matches!(result, Err(Error::TranscriptNotFound(_))));
        assert_eq!(block_on(store.chunk_count()).unwrap(), 0);
    }

    #[test]
    fn bulk_insert_assigns_sequential_positions() {
        let store = store();
        let transcript = block_on(store.insert_transcript_with_chunks(
            NewTranscript::default(),
            "text",
            Vec::new(),
        ))
        .unwrap();
        assert_eq!(transcript.total_chunks, 0);

        block_on(store.bulk_insert(
            transcript.id,
            vec![
                chunk("a", vec![1.0, 0.0, 0.0]),
                chunk("b", vec![0.0, 1.0, 0.0]),
            ],
        ))
        .unwrap();

        let refreshed = block_on(store.get_transcript(transcript.id)).unwrap().unwrap();
        assert_eq!(refreshed.total_chunks, 2);
    }

    #[test]
    fn metadata_patch_updates_only_set_fields() {
        let store = store();
        let transcript = block_on(store.insert_transcript_with_chunks(
            NewTranscript {
                title: Some("Original title".into()),
                trainer_name: Some("Jordan".into()),
                ..Default::default()
            },
            "text",
            Vec::new(),
        ))
        .unwrap();

        let updated = block_on(store.update_metadata(
            transcript.id,
            TranscriptPatch {
                title: Some("New title".into()),
                ..Default::default()
            },
        ))
        .unwrap();

        assert_eq!(updated.title.as_deref(), Some("New title"));
        assert_eq!(updated.trainer_name.as_deref(), Some("Jordan"));
    }
}

use std::path::PathBuf;

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::core::config::AppPaths;
use crate::core::errors::ApiError;
use crate::qa::types::Chunk;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub id: String,
    pub owner: String,
    pub original_text: String,
    pub qa_ready: bool,
    pub created_at: String,
}

/// SQLite-backed document store: document text plus the persisted
/// chunk/embedding state. Embeddings are stored as little-endian f32 blobs.
/// All document lookups are owner-scoped; there is no ambient session state.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl DocumentStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.documents_db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                original_text TEXT NOT NULL,
                qa_ready INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS document_chunks (
                document_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (document_id, chunk_index),
                FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    pub async fn insert_document(
        &self,
        owner: &str,
        original_text: &str,
    ) -> Result<String, ApiError> {
        let document_id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO documents (id, owner, original_text) VALUES (?1, ?2, ?3)")
            .bind(&document_id)
            .bind(owner)
            .bind(original_text)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(document_id)
    }

    pub async fn get_document(
        &self,
        owner: &str,
        document_id: &str,
    ) -> Result<Option<DocumentRecord>, ApiError> {
        let row = sqlx::query(
            "SELECT id, owner, original_text, qa_ready, created_at
             FROM documents WHERE id = ?1 AND owner = ?2",
        )
        .bind(document_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        row.map(document_from_row)
            .transpose()
            .map_err(ApiError::internal)
    }

    /// Whether the document exists, is owned by `owner`, and has a prepared
    /// chunk set. A missing document is `NotFound`, not `false`.
    pub async fn is_ready_for_retrieval(
        &self,
        owner: &str,
        document_id: &str,
    ) -> Result<bool, ApiError> {
        let ready: Option<i64> =
            sqlx::query_scalar("SELECT qa_ready FROM documents WHERE id = ?1 AND owner = ?2")
                .bind(document_id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await
                .map_err(ApiError::internal)?;

        match ready {
            Some(flag) => Ok(flag != 0),
            None => Err(ApiError::NotFound(format!("document {document_id}"))),
        }
    }

    /// The document's chunks in original order.
    pub async fn get_chunks(&self, document_id: &str) -> Result<Vec<Chunk>, ApiError> {
        let rows = sqlx::query(
            "SELECT content, embedding FROM document_chunks
             WHERE document_id = ?1 ORDER BY chunk_index ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut chunks = Vec::with_capacity(rows.len());
        for row in rows {
            let content: String = row.try_get("content").map_err(ApiError::internal)?;
            let blob: Vec<u8> = row.try_get("embedding").map_err(ApiError::internal)?;
            chunks.push(Chunk {
                text: content,
                embedding: deserialize_embedding(&blob),
            });
        }

        Ok(chunks)
    }

    /// Replace the document's chunk set wholesale and mark it ready, in one
    /// transaction. A failure rolls everything back, leaving the previous
    /// prepared state untouched.
    pub async fn replace_chunks(
        &self,
        document_id: &str,
        chunks: &[Chunk],
    ) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query("DELETE FROM document_chunks WHERE document_id = ?1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        for (index, chunk) in chunks.iter().enumerate() {
            sqlx::query(
                "INSERT INTO document_chunks (document_id, chunk_index, content, embedding)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(document_id)
            .bind(index as i64)
            .bind(&chunk.text)
            .bind(serialize_embedding(&chunk.embedding))
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        let updated = sqlx::query("UPDATE documents SET qa_ready = 1 WHERE id = ?1")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        if updated.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("document {document_id}")));
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    pub async fn count_chunks(&self, document_id: &str) -> Result<usize, ApiError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM document_chunks WHERE document_id = ?1")
                .bind(document_id)
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::internal)?;

        Ok(count as usize)
    }
}

fn document_from_row(row: sqlx::sqlite::SqliteRow) -> Result<DocumentRecord, sqlx::Error> {
    let qa_ready: i64 = row.try_get("qa_ready")?;

    Ok(DocumentRecord {
        id: row.try_get("id")?,
        owner: row.try_get("owner")?,
        original_text: row.try_get("original_text")?,
        qa_ready: qa_ready != 0,
        created_at: row.try_get("created_at")?,
    })
}

fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

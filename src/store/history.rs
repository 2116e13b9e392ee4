use std::path::PathBuf;

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use crate::core::config::AppPaths;
use crate::core::errors::ApiError;
use crate::qa::types::AnswerResult;

#[derive(Debug, Clone, Serialize)]
pub struct QaHistoryEntry {
    pub question: String,
    pub answer: String,
    pub source_chunk: Option<String>,
    pub confidence: f32,
    pub found: bool,
    pub error: Option<String>,
    pub created_at: String,
}

/// Ordered per-document Q&A log. Every committed answer (found, not found
/// or failed) is appended with a timestamp.
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl HistoryStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.history_db_path.clone()).await
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
            "CREATE TABLE IF NOT EXISTS qa_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document_id TEXT NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                source_chunk TEXT,
                confidence REAL NOT NULL DEFAULT 0,
                found INTEGER NOT NULL DEFAULT 0,
                error TEXT,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_qa_history_document_id
             ON qa_history(document_id, id)",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    pub async fn append(&self, document_id: &str, result: &AnswerResult) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO qa_history
                (document_id, question, answer, source_chunk, confidence, found, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(document_id)
        .bind(&result.question)
        .bind(&result.answer)
        .bind(result.source_chunk.as_deref())
        .bind(result.confidence as f64)
        .bind(result.found as i64)
        .bind(result.error.as_deref())
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    /// The document's log in insertion order.
    pub async fn for_document(&self, document_id: &str) -> Result<Vec<QaHistoryEntry>, ApiError> {
        let rows = sqlx::query(
            "SELECT question, answer, source_chunk, confidence, found, error, created_at
             FROM qa_history WHERE document_id = ?1 ORDER BY id ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        rows.into_iter()
            .map(entry_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::internal)
    }

    pub async fn count(&self, document_id: &str) -> Result<usize, ApiError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM qa_history WHERE document_id = ?1")
                .bind(document_id)
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::internal)?;

        Ok(count as usize)
    }
}

fn entry_from_row(row: sqlx::sqlite::SqliteRow) -> Result<QaHistoryEntry, sqlx::Error> {
    let confidence: f64 = row.try_get("confidence")?;
    let found: i64 = row.try_get("found")?;

    Ok(QaHistoryEntry {
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        source_chunk: row.try_get("source_chunk")?,
        confidence: confidence as f32,
        found: found != 0,
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn test_store() -> HistoryStore {
        let tmp = std::env::temp_dir().join(format!("docqa-history-test-{}.db", Uuid::new_v4()));
        HistoryStore::with_path(tmp).await.unwrap()
    }

    #[tokio::test]
    async fn appends_preserve_insertion_order() {
        let store = test_store().await;

        store
            .append(
                "doc-1",
                &AnswerResult::resolved("q1", "a1".to_string(), "chunk".to_string(), 0.7),
            )
            .await
            .unwrap();
        store
            .append("doc-1", &AnswerResult::not_found("q2"))
            .await
            .unwrap();

        let entries = store.for_document("doc-1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].question, "q1");
        assert!(entries[0].found);
        assert!((entries[0].confidence - 0.7).abs() < 1e-6);
        assert_eq!(entries[1].question, "q2");
        assert!(!entries[1].found);
        assert!(entries[1].source_chunk.is_none());
        assert!(!entries[1].created_at.is_empty());
    }

    #[tokio::test]
    async fn logs_are_per_document() {
        let store = test_store().await;

        store
            .append("doc-a", &AnswerResult::not_found("q"))
            .await
            .unwrap();

        assert_eq!(store.count("doc-a").await.unwrap(), 1);
        assert_eq!(store.count("doc-b").await.unwrap(), 0);
        assert!(store.for_document("doc-b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_results_keep_their_error_marker() {
        let store = test_store().await;

        let err = ApiError::EmbeddingService("boom".to_string());
        store
            .append("doc-1", &AnswerResult::failed("q", &err))
            .await
            .unwrap();

        let entries = store.for_document("doc-1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].found);
        assert!(entries[0].error.as_deref().unwrap().contains("boom"));
    }
}

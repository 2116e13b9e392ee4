use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

const OWNER_HEADER: &str = "x-owner-id";
const DEFAULT_OWNER: &str = "local";

/// Caller identity for owner-scoped lookups. Authentication proper is out
/// of scope; the identity still travels as an explicit parameter.
fn owner_from_headers(headers: &HeaderMap) -> String {
    headers
        .get(OWNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_OWNER)
        .to_string()
}

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub text: String,
}

pub async fn create_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateDocumentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.text.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "document text must not be empty".to_string(),
        ));
    }

    let owner = owner_from_headers(&headers);
    let document_id = state
        .documents
        .insert_document(&owner, &payload.text)
        .await?;

    Ok(Json(json!({ "document_id": document_id })))
}

pub async fn prepare_document(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let owner = owner_from_headers(&headers);

    let document = state
        .documents
        .get_document(&owner, &document_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("document {document_id}")))?;

    let chunk_count = state
        .pipeline
        .prepare_document(&owner, &document_id, &document.original_text)
        .await?;

    Ok(Json(json!({
        "message": "Document ready for question answering",
        "chunk_count": chunk_count
    })))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = owner_from_headers(&headers);
    let result = state
        .pipeline
        .answer_one(&owner, &document_id, &payload.question)
        .await?;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct AskMultipleRequest {
    pub questions: Vec<String>,
}

pub async fn ask_multiple(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<AskMultipleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = owner_from_headers(&headers);
    let results = state
        .pipeline
        .answer_many(&owner, &document_id, &payload.questions)
        .await?;

    Ok(Json(json!({ "answers": results })))
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let owner = owner_from_headers(&headers);

    // scope check before exposing the log
    state
        .documents
        .get_document(&owner, &document_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("document {document_id}")))?;

    let entries = state.history.for_document(&document_id).await?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_defaults_when_header_is_absent_or_blank() {
        let headers = HeaderMap::new();
        assert_eq!(owner_from_headers(&headers), "local");

        let mut headers = HeaderMap::new();
        headers.insert(OWNER_HEADER, "  ".parse().unwrap());
        assert_eq!(owner_from_headers(&headers), "local");
    }

    #[test]
    fn owner_header_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(OWNER_HEADER, " alice ".parse().unwrap());
        assert_eq!(owner_from_headers(&headers), "alice");
    }
}

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

pub const NOT_FOUND_ANSWER: &str =
    "I could not find relevant information in the document to answer this question.";
pub const FAILED_QUESTION_ANSWER: &str = "Error processing question";

/// The minimum retrievable unit: a contiguous slice of document text paired
/// with its embedding. Immutable once created; a document's chunk set is
/// replaced wholesale on re-preparation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A chunk scored against one query. Transient, never persisted.
#[derive(Debug, Clone)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub similarity: f32,
}

/// Outcome of answering one question.
///
/// Constructed only through the methods below so the field invariants hold:
/// `found == false` implies `confidence == 0.0` and `source_chunk == None`;
/// `found == true` implies `confidence` is the gated top similarity and
/// `source_chunk` the top-ranked chunk's text.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub question: String,
    pub answer: String,
    pub source_chunk: Option<String>,
    pub confidence: f32,
    pub found: bool,
    pub error: Option<String>,
}

impl AnswerResult {
    pub fn resolved(
        question: &str,
        answer: String,
        source_chunk: String,
        confidence: f32,
    ) -> Self {
        Self {
            question: question.to_string(),
            answer,
            source_chunk: Some(source_chunk),
            confidence,
            found: true,
            error: None,
        }
    }

    pub fn not_found(question: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: NOT_FOUND_ANSWER.to_string(),
            source_chunk: None,
            confidence: 0.0,
            found: false,
            error: None,
        }
    }

    pub fn failed(question: &str, error: &ApiError) -> Self {
        Self {
            question: question.to_string(),
            answer: FAILED_QUESTION_ANSWER.to_string(),
            source_chunk: None,
            confidence: 0.0,
            found: false,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_results_carry_no_provenance() {
        let result = AnswerResult::not_found("q");
        assert!(!result.found);
        assert_eq!(result.confidence, 0.0);
        assert!(result.source_chunk.is_none());
        assert!(result.error.is_none());
    }

    #[test]
    fn failed_results_record_the_error() {
        let err = ApiError::EmbeddingService("timeout".to_string());
        let result = AnswerResult::failed("q", &err);
        assert!(!result.found);
        assert_eq!(result.confidence, 0.0);
        assert!(result.source_chunk.is_none());
        assert_eq!(result.answer, FAILED_QUESTION_ANSWER);
        assert!(result.error.unwrap().contains("timeout"));
    }

    #[test]
    fn resolved_results_carry_the_top_chunk() {
        let result = AnswerResult::resolved("q", "a".to_string(), "chunk".to_string(), 0.8);
        assert!(result.found);
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.source_chunk.as_deref(), Some("chunk"));
    }
}

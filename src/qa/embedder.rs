use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::provider::LanguageModel;

/// Sole vectorization gateway: turns a text unit or a question into a
/// fixed-dimension vector via the external model service.
///
/// Inputs over the service budget are truncated on a char boundary before
/// submission; the truncation is logged, never silent. Failures are not
/// retried here; retry policy belongs to the caller.
#[derive(Clone)]
pub struct Embedder {
    llm: Arc<dyn LanguageModel>,
    max_chars: usize,
}

impl Embedder {
    pub fn new(llm: Arc<dyn LanguageModel>, max_chars: usize) -> Self {
        Self { llm, max_chars }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let (prepared, truncated) = truncate_chars(text, self.max_chars);
        if truncated {
            tracing::warn!(
                "Embedding input truncated from {} to {} chars",
                text.chars().count(),
                self.max_chars
            );
        }

        let mut vectors = self.llm.embed(std::slice::from_ref(&prepared)).await?;

        if vectors.len() != 1 {
            return Err(ApiError::EmbeddingService(format!(
                "expected 1 embedding, got {}",
                vectors.len()
            )));
        }

        let vector = vectors.remove(0);
        if vector.is_empty() {
            return Err(ApiError::EmbeddingService(
                "service returned an empty embedding".to_string(),
            ));
        }

        Ok(vector)
    }
}

/// Deterministic char-boundary truncation. Returns the (possibly shortened)
/// text and whether anything was dropped.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => (text[..byte_offset].to_string(), true),
        None => (text.to_string(), false),
    }
}

use async_trait::async_trait;

use crate::core::errors::ApiError;

/// External language model service: one capability for vectorization, one
/// for constrained text generation. Transport failures surface as
/// `EmbeddingService` / `GenerationService`; retry policy belongs to callers.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// generate one embedding vector per input, all of the same dimension
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;

    /// single-turn completion under a system instruction (non-streaming)
    async fn generate(&self, system: &str, user: &str) -> Result<String, ApiError>;
}

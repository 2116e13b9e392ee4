use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::provider::LanguageModel;
use crate::qa::embedder::truncate_chars;
use crate::qa::types::RankedChunk;

const CONTEXT_DELIMITER: &str = "\n\n";

const SYSTEM_INSTRUCTION: &str = "You are a document analysis assistant. \
Answer ONLY based on the provided context. If the answer is not in the \
context, say \"The document does not contain information to answer this \
question.\" Do not use external knowledge.";

/// Output of one synthesis call. `source_chunk` is the single top-ranked
/// chunk's text even when more chunks were merged into the context, and
/// `confidence` is that chunk's similarity; the generation step reports no
/// confidence of its own.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub answer: String,
    pub source_chunk: String,
    pub confidence: f32,
}

/// Builds a grounded context window from the top-ranked chunks and requests
/// one constrained completion from the external model service.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    llm: Arc<dyn LanguageModel>,
    max_context_chars: usize,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>, max_context_chars: usize) -> Self {
        Self {
            llm,
            max_context_chars,
        }
    }

    pub async fn synthesize(
        &self,
        question: &str,
        top_chunks: &[RankedChunk],
    ) -> Result<Synthesis, ApiError> {
        let Some(top) = top_chunks.first() else {
            return Err(ApiError::InvalidInput(
                "cannot synthesize without context chunks".to_string(),
            ));
        };

        let context = self.build_context(top_chunks);
        let user_prompt = format!(
            "Context from document:\n{context}\n\nQuestion: {question}\n\nAnswer based ONLY on the context above:"
        );

        let answer = self.llm.generate(SYSTEM_INSTRUCTION, &user_prompt).await?;

        Ok(Synthesis {
            answer,
            source_chunk: top.chunk.text.clone(),
            confidence: top.similarity,
        })
    }

    fn build_context(&self, top_chunks: &[RankedChunk]) -> String {
        let joined = top_chunks
            .iter()
            .map(|ranked| ranked.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_DELIMITER);

        let (context, truncated) = truncate_chars(&joined, self.max_context_chars);
        if truncated {
            tracing::warn!(
                "Context truncated from {} to {} chars before generation",
                joined.chars().count(),
                self.max_context_chars
            );
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::qa::types::Chunk;

    struct CapturingModel {
        captured: Mutex<Option<(String, String)>>,
        reply: String,
    }

    impl CapturingModel {
        fn new(reply: &str) -> Self {
            Self {
                captured: Mutex::new(None),
                reply: reply.to_string(),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for CapturingModel {
        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Err(ApiError::EmbeddingService("not used".to_string()))
        }

        async fn generate(&self, system: &str, user: &str) -> Result<String, ApiError> {
            *self.captured.lock().unwrap() = Some((system.to_string(), user.to_string()));
            Ok(self.reply.clone())
        }
    }

    fn ranked(text: &str, similarity: f32) -> RankedChunk {
        RankedChunk {
            chunk: Chunk {
                text: text.to_string(),
                embedding: vec![],
            },
            similarity,
        }
    }

    #[tokio::test]
    async fn context_joins_chunks_in_rank_order() {
        let model = Arc::new(CapturingModel::new("an answer"));
        let synthesizer = AnswerSynthesizer::new(model.clone(), 4000);

        let chunks = vec![ranked("first chunk", 0.9), ranked("second chunk", 0.5)];
        let synthesis = synthesizer.synthesize("why?", &chunks).await.unwrap();

        assert_eq!(synthesis.answer, "an answer");
        assert_eq!(synthesis.source_chunk, "first chunk");
        assert_eq!(synthesis.confidence, 0.9);

        let (system, user) = model.captured.lock().unwrap().clone().unwrap();
        assert!(system.contains("ONLY based on the provided context"));
        assert!(user.contains("first chunk\n\nsecond chunk"));
        assert!(user.contains("Question: why?"));
    }

    #[tokio::test]
    async fn context_respects_the_char_budget() {
        let model = Arc::new(CapturingModel::new("ok"));
        let synthesizer = AnswerSynthesizer::new(model.clone(), 10);

        let chunks = vec![ranked("a very long chunk of text", 0.8)];
        synthesizer.synthesize("q", &chunks).await.unwrap();

        let (_, user) = model.captured.lock().unwrap().clone().unwrap();
        assert!(user.contains("a very lon"));
        assert!(!user.contains("a very long"));
    }

    #[tokio::test]
    async fn refuses_an_empty_chunk_list() {
        let model = Arc::new(CapturingModel::new("unused"));
        let synthesizer = AnswerSynthesizer::new(model, 4000);

        assert!(matches!(
            synthesizer.synthesize("q", &[]).await,
            Err(ApiError::InvalidInput(_))
        ));
    }
}

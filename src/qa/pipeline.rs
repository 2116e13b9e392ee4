use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::llm::provider::LanguageModel;
use crate::qa::chunker::Chunker;
use crate::qa::embedder::Embedder;
use crate::qa::gate::{ConfidenceGate, GateDecision};
use crate::qa::ranker;
use crate::qa::synthesizer::AnswerSynthesizer;
use crate::qa::types::{AnswerResult, Chunk};
use crate::store::documents::DocumentStore;
use crate::store::history::HistoryStore;

/// Drives the retrieval pipeline over one or many questions against a
/// prepared document.
///
/// Questions in a batch run strictly sequentially: one result per question
/// in input order, and a failure on one question never aborts the rest. The
/// only suspension points are the embedding and generation calls; a
/// document's chunk set is read-only for the duration of a batch.
#[derive(Clone)]
pub struct QaPipeline {
    documents: DocumentStore,
    history: HistoryStore,
    chunker: Chunker,
    embedder: Embedder,
    gate: ConfidenceGate,
    synthesizer: AnswerSynthesizer,
}

impl QaPipeline {
    pub fn new(
        documents: DocumentStore,
        history: HistoryStore,
        llm: Arc<dyn LanguageModel>,
        settings: &Settings,
    ) -> Self {
        let retrieval = &settings.retrieval;
        Self {
            documents,
            history,
            chunker: Chunker::new(retrieval.chunk_size),
            embedder: Embedder::new(llm.clone(), retrieval.max_embed_chars),
            gate: ConfidenceGate::new(retrieval.similarity_threshold, retrieval.top_k),
            synthesizer: AnswerSynthesizer::new(llm, retrieval.max_context_chars),
        }
    }

    /// Chunk and embed `full_text`, replacing the document's persisted chunk
    /// set wholesale. Any chunking or embedding failure propagates and the
    /// document keeps its previous prepared state.
    pub async fn prepare_document(
        &self,
        owner: &str,
        document_id: &str,
        full_text: &str,
    ) -> Result<usize, ApiError> {
        self.documents
            .get_document(owner, document_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("document {document_id}")))?;

        let units = self.chunker.chunk(full_text)?;

        let mut chunks = Vec::with_capacity(units.len());
        for text in units {
            let embedding = self.embedder.embed(&text).await?;
            chunks.push(Chunk { text, embedding });
        }

        self.documents.replace_chunks(document_id, &chunks).await?;
        tracing::info!(
            "Prepared document {} with {} chunks",
            document_id,
            chunks.len()
        );

        Ok(chunks.len())
    }

    /// Answer a single question. Pipeline errors propagate to the caller;
    /// a below-threshold retrieval is a normal `found=false` result.
    pub async fn answer_one(
        &self,
        owner: &str,
        document_id: &str,
        question: &str,
    ) -> Result<AnswerResult, ApiError> {
        let chunks = self.prepared_chunks(owner, document_id).await?;

        let result = self.process(question, &chunks).await?;
        self.history.append(document_id, &result).await?;

        Ok(result)
    }

    /// Answer a batch of questions sequentially, one result per question in
    /// input order. Per-question failures are contained in that question's
    /// result and never abort the batch.
    pub async fn answer_many(
        &self,
        owner: &str,
        document_id: &str,
        questions: &[String],
    ) -> Result<Vec<AnswerResult>, ApiError> {
        if questions.is_empty() {
            return Err(ApiError::InvalidInput(
                "questions must be a non-empty list".to_string(),
            ));
        }

        let chunks = self.prepared_chunks(owner, document_id).await?;

        let mut results = Vec::with_capacity(questions.len());
        for question in questions {
            let result = match self.process(question, &chunks).await {
                Ok(result) => result,
                Err(err) => {
                    tracing::warn!("Question failed, continuing batch: {}", err);
                    AnswerResult::failed(question, &err)
                }
            };

            self.history.append(document_id, &result).await?;
            results.push(result);
        }

        Ok(results)
    }

    /// One question through embed -> rank -> gate -> synthesize.
    async fn process(&self, question: &str, chunks: &[Chunk]) -> Result<AnswerResult, ApiError> {
        if question.trim().is_empty() {
            return Err(ApiError::InvalidInput("question is empty".to_string()));
        }

        let query = self.embedder.embed(question).await?;
        let ranked = ranker::rank(&query, chunks)?;

        match self.gate.evaluate(ranked) {
            GateDecision::NotFound => Ok(AnswerResult::not_found(question)),
            GateDecision::Proceed(top) => {
                let synthesis = self.synthesizer.synthesize(question, &top).await?;
                Ok(AnswerResult::resolved(
                    question,
                    synthesis.answer,
                    synthesis.source_chunk,
                    synthesis.confidence,
                ))
            }
        }
    }

    async fn prepared_chunks(
        &self,
        owner: &str,
        document_id: &str,
    ) -> Result<Vec<Chunk>, ApiError> {
        if !self
            .documents
            .is_ready_for_retrieval(owner, document_id)
            .await?
        {
            return Err(ApiError::Precondition(
                "document is not prepared for question answering".to_string(),
            ));
        }

        self.documents.get_chunks(document_id).await
    }
}

//! Retrieval-augmented question answering over prepared documents.
//!
//! The pipeline runs Chunker -> Embedder -> ranker -> ConfidenceGate ->
//! AnswerSynthesizer, orchestrated by `QaPipeline` for single questions and
//! ordered batches with per-question failure isolation.

pub mod chunker;
pub mod embedder;
pub mod gate;
pub mod pipeline;
pub mod ranker;
pub mod synthesizer;
pub mod types;

pub use chunker::Chunker;
pub use embedder::Embedder;
pub use gate::{ConfidenceGate, GateDecision};
pub use pipeline::QaPipeline;
pub use synthesizer::AnswerSynthesizer;
pub use types::{AnswerResult, Chunk, RankedChunk};

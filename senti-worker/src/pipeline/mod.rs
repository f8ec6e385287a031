//! Sentiment batching pipeline
//!
//! ```text
//! DocumentInput ──► chunker ──► scorer (per chunk) ──► sort by id ──► translator
//!                                    │
//!                                    └─► SentimentClassifier (one call per chunk)
//! ```

pub mod chunker;
pub mod input;
pub mod orchestrator;
pub mod scorer;
pub mod translator;

pub use chunker::{chunk_documents, Chunk};
pub use input::DocumentInput;
pub use orchestrator::{PipelineConfig, SentimentPipeline, DEFAULT_MAX_WORDS};
pub use scorer::score_chunk;
pub use translator::{failure_messages, translate, translate_all};

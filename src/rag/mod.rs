//! Retrieval-augmented answering.
//!
//! - `Chunker`: splits source documents into overlapping chunks for ingestion
//! - `PromptTemplate`: the `{context}` / `{question}` prompt
//! - `Retriever`: thresholded top-k search over the vector index
//! - `AnswerChain`: retrieve, render, generate

mod chain;
mod chunker;
mod prompt;
mod retriever;

pub use chain::{Answer, AnswerChain};
pub use chunker::{Chunker, ChunkerConfig, TextChunk};
pub use prompt::PromptTemplate;
pub use retriever::Retriever;

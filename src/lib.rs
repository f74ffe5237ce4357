pub mod core;
pub mod embeddings;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod vector;

#[cfg(test)]
mod test_support;

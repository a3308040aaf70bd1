// Embeddings module
// Turns free-text probes into the vectors the storage backend searches with

pub mod ollama;

pub use ollama::OllamaClient;

use anyhow::Result;

/// Text-to-vector seam between the backend and the embedding service.
///
/// The production implementation is [`OllamaClient`]; tests substitute a
/// deterministic embedder so no service needs to be running.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

use crate::error::{IndexError, ProviderError};
use crate::models::{Chunk, QueryFilter, RetrievedChunk};
use async_trait::async_trait;

/// Nearest-neighbour store of embedded chunks ranked by cosine distance.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Stores `chunks` with their precomputed `embeddings`, one per chunk.
    ///
    /// A single call is visible to concurrent readers all at once or not at all.
    async fn add(
        &self,
        chunks: &[Chunk],
        source_document: &str,
        embeddings: &[Vec<f32>],
    ) -> Result<usize, IndexError>;

    /// Returns up to `k` nearest chunks; `k` is clamped to the stored count.
    async fn query(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<RetrievedChunk>, IndexError>;

    async fn count(&self) -> Result<usize, IndexError>;

    async fn clear(&self) -> Result<(), IndexError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

use crate::error::IndexError;
use crate::models::{Chunk, ChunkMetadata, QueryFilter, RetrievedChunk, StoredChunk};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Brute-force cosine index held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    chunks: RwLock<Vec<StoredChunk>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn add(
        &self,
        chunks: &[Chunk],
        source_document: &str,
        embeddings: &[Vec<f32>],
    ) -> Result<usize, IndexError> {
        if chunks.len() != embeddings.len() {
            return Err(IndexError::MissingEmbeddings {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let dimension = embeddings.first().map(Vec::len);
        if let (Some(expected), Some(bad)) = (
            dimension,
            embeddings.iter().find(|embedding| Some(embedding.len()) != dimension),
        ) {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        let stored = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| StoredChunk {
                id: Uuid::new_v4().to_string(),
                text: chunk.text.clone(),
                metadata: ChunkMetadata::for_chunk(chunk, source_document),
                embedding: embedding.clone(),
            })
            .collect::<Vec<_>>();

        let mut guard = self.chunks.write().await;
        if let (Some(existing), Some(actual)) = (guard.first(), dimension) {
            if existing.embedding.len() != actual {
                return Err(IndexError::DimensionMismatch {
                    expected: existing.embedding.len(),
                    actual,
                });
            }
        }

        let added = stored.len();
        guard.extend(stored);
        Ok(added)
    }

    async fn query(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<RetrievedChunk>, IndexError> {
        let guard = self.chunks.read().await;
        let limit = k.min(guard.len());
        if limit == 0 {
            return Ok(Vec::new());
        }

        if let Some(stored) = guard.first() {
            if stored.embedding.len() != query_embedding.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: stored.embedding.len(),
                    actual: query_embedding.len(),
                });
            }
        }

        let mut scored = guard
            .iter()
            .filter(|stored| filter.map_or(true, |filter| filter.matches(&stored.metadata)))
            .map(|stored| (cosine_distance(query_embedding, &stored.embedding), stored))
            .collect::<Vec<_>>();

        scored.sort_by(|left, right| left.0.total_cmp(&right.0));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(distance, stored)| RetrievedChunk {
                text: stored.text.clone(),
                metadata: stored.metadata.clone(),
                distance: Some(distance),
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.chunks.read().await.len())
    }

    async fn clear(&self) -> Result<(), IndexError> {
        self.chunks.write().await.clear();
        Ok(())
    }
}

/// `1 - cos(a, b)`, clamped to `[0, 2]`. A zero vector is treated as orthogonal.
pub fn cosine_distance(left: &[f32], right: &[f32]) -> f32 {
    let dot = left.iter().zip(right).map(|(a, b)| a * b).sum::<f32>();
    let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();

    if left_norm == 0.0 || right_norm == 0.0 {
        return 1.0;
    }

    (1.0 - dot / (left_norm * right_norm)).clamp(0.0, 2.0)
}

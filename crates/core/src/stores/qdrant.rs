use crate::error::IndexError;
use crate::models::{Chunk, ChunkMetadata, QueryFilter, RetrievedChunk};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

const BACKEND: &str = "qdrant";

/// Qdrant collection accessed over its REST API, configured for cosine distance.
pub struct QdrantStore {
    endpoint: String,
    collection: String,
    client: Client,
    vector_size: usize,
}

impl QdrantStore {
    pub fn new(endpoint: impl Into<String>, collection: impl Into<String>, vector_size: usize) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            collection: collection.into(),
            client: Client::new(),
            vector_size,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }

    pub async fn ensure_collection(&self) -> Result<(), IndexError> {
        let response = self.client.get(self.collection_url()).send().await?;

        if response.status().is_success() {
            return Ok(());
        }

        if response.status() != StatusCode::NOT_FOUND {
            return Err(backend_error(response.status().to_string()));
        }

        self.create_collection().await
    }

    async fn create_collection(&self) -> Result<(), IndexError> {
        let response = self
            .client
            .put(self.collection_url())
            .json(&json!({
                "vectors": {
                    "size": self.vector_size,
                    "distance": "Cosine",
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status().to_string()));
        }

        info!(collection = %self.collection, vector_size = self.vector_size, "created qdrant collection");
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
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

        let points = chunks
            .iter()
            .zip(embeddings.iter())
            .map(|(chunk, embedding)| {
                if embedding.len() != self.vector_size {
                    return Err(IndexError::DimensionMismatch {
                        expected: self.vector_size,
                        actual: embedding.len(),
                    });
                }

                Ok(json!({
                    "id": Uuid::new_v4().to_string(),
                    "vector": embedding,
                    "payload": point_payload(chunk, source_document),
                }))
            })
            .collect::<Result<Vec<_>, IndexError>>()?;

        if points.is_empty() {
            return Ok(0);
        }

        // One upsert per ingestion so readers never observe half a document.
        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status().to_string()));
        }

        debug!(source_document, points = points.len(), "upserted points");
        Ok(points.len())
    }

    async fn query(
        &self,
        query_embedding: &[f32],
        k: usize,
        filter: Option<&QueryFilter>,
    ) -> Result<Vec<RetrievedChunk>, IndexError> {
        if query_embedding.len() != self.vector_size {
            return Err(IndexError::DimensionMismatch {
                expected: self.vector_size,
                actual: query_embedding.len(),
            });
        }

        let limit = k.min(self.count().await?);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut body = json!({
            "vector": query_embedding,
            "limit": limit,
            "with_payload": true,
        });
        if let Some(filter) = filter.and_then(filter_clause) {
            body["filter"] = filter;
        }

        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response.status().to_string()));
        }

        let parsed: Value = response.json().await?;
        let hits = parsed
            .pointer("/result")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(hits.iter().filter_map(hit_to_retrieved).collect())
    }

    async fn count(&self) -> Result<usize, IndexError> {
        let response = self
            .client
            .post(format!("{}/points/count", self.collection_url()))
            .json(&json!({ "exact": true }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }

        if !response.status().is_success() {
            return Err(backend_error(response.status().to_string()));
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/result/count")
            .and_then(Value::as_u64)
            .map(|count| count as usize)
            .ok_or_else(|| backend_error(format!("missing count in response: {parsed}")))
    }

    async fn clear(&self) -> Result<(), IndexError> {
        let response = self.client.delete(self.collection_url()).send().await?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(backend_error(response.status().to_string()));
        }

        self.create_collection().await
    }
}

fn point_payload(chunk: &Chunk, source_document: &str) -> Value {
    json!({
        "text": chunk.text,
        "source_document": source_document,
        "page": chunk.page,
        "chunk_index": chunk.chunk_index,
        "total_pages": chunk.total_pages,
    })
}

fn filter_clause(filter: &QueryFilter) -> Option<Value> {
    filter.source_document.as_ref().map(|name| {
        json!({
            "must": [
                { "key": "source_document", "match": { "value": name } }
            ]
        })
    })
}

fn hit_to_retrieved(hit: &Value) -> Option<RetrievedChunk> {
    let payload = hit.pointer("/payload")?;
    let text = payload.pointer("/text").and_then(Value::as_str)?.to_string();
    let as_u32 = |key: &str| {
        payload
            .pointer(key)
            .and_then(Value::as_u64)
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or_default()
    };

    Some(RetrievedChunk {
        text,
        metadata: ChunkMetadata {
            source_document: payload
                .pointer("/source_document")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            page: as_u32("/page"),
            chunk_index: as_u32("/chunk_index"),
            total_pages: as_u32("/total_pages"),
        },
        // Qdrant reports cosine similarity for cosine collections.
        distance: hit
            .pointer("/score")
            .and_then(Value::as_f64)
            .map(|score| (1.0 - score as f32).clamp(0.0, 2.0)),
    })
}

fn backend_error(details: String) -> IndexError {
    IndexError::BackendResponse {
        backend: BACKEND.to_string(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_hit_is_converted_to_distance() {
        let hit = json!({
            "id": "4a6f3c2e-0000-0000-0000-000000000000",
            "score": 0.75,
            "payload": {
                "text": "Torque the bolts to 40 Nm.",
                "source_document": "service.pdf",
                "page": 12,
                "chunk_index": 3,
                "total_pages": 80
            }
        });

        let retrieved = hit_to_retrieved(&hit).expect("payload has text");

        assert_eq!(retrieved.text, "Torque the bolts to 40 Nm.");
        assert_eq!(retrieved.metadata.source_document, "service.pdf");
        assert_eq!(retrieved.metadata.page, 12);
        assert_eq!(retrieved.metadata.chunk_index, 3);
        assert_eq!(retrieved.metadata.total_pages, 80);
        assert_eq!(retrieved.distance, Some(0.25));
    }

    #[test]
    fn out_of_range_payload_numbers_fall_back_to_zero() {
        let hit = json!({
            "score": 0.5,
            "payload": {
                "text": "Appendix.",
                "source_document": "big.pdf",
                "page": 4_294_967_297u64,
                "chunk_index": 2,
                "total_pages": -1
            }
        });

        let retrieved = hit_to_retrieved(&hit).expect("payload has text");

        assert_eq!(retrieved.metadata.page, 0);
        assert_eq!(retrieved.metadata.chunk_index, 2);
        assert_eq!(retrieved.metadata.total_pages, 0);
    }

    #[test]
    fn hit_without_text_is_skipped() {
        let hit = json!({ "score": 0.9, "payload": { "page": 1 } });
        assert!(hit_to_retrieved(&hit).is_none());
    }

    #[test]
    fn filter_clause_matches_on_document() {
        assert!(filter_clause(&QueryFilter::default()).is_none());

        let clause = filter_clause(&QueryFilter::document("a.pdf")).expect("filter set");
        assert_eq!(
            clause.pointer("/must/0/match/value").and_then(Value::as_str),
            Some("a.pdf")
        );
    }

    #[tokio::test]
    async fn add_rejects_missing_embeddings_before_any_request() {
        let store = QdrantStore::new("http://127.0.0.1:9", "chunks", 4);
        let chunk = Chunk {
            text: "text".to_string(),
            page: 1,
            chunk_index: 0,
            total_pages: 1,
        };

        let result = store.add(&[chunk], "doc.pdf", &[]).await;
        assert!(matches!(result, Err(IndexError::MissingEmbeddings { .. })));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SNIPPET_CHARS: usize = 200;

/// A bounded span of one page's extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub page: u32,
    pub chunk_index: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_document: String,
    pub page: u32,
    pub chunk_index: u32,
    pub total_pages: u32,
}

impl ChunkMetadata {
    pub fn for_chunk(chunk: &Chunk, source_document: &str) -> Self {
        Self {
            source_document: source_document.to_string(),
            page: chunk.page,
            chunk_index: chunk.chunk_index,
            total_pages: chunk.total_pages,
        }
    }

    pub fn source_key(&self) -> SourceKey {
        SourceKey {
            source_document: self.source_document.clone(),
            page: self.page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Cosine distance in `[0, 2]`; absent when the backend does not report one.
    pub distance: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceKey {
    pub source_document: String,
    pub page: u32,
}

/// Retrieved chunks sharing one `(document, page)` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub source_num: usize,
    pub key: SourceKey,
    pub chunks: Vec<String>,
}

impl Source {
    pub fn combined_text(&self) -> String {
        self.chunks.join(" ")
    }

    pub fn citation(&self) -> Citation {
        let first = self.chunks.first().map(String::as_str).unwrap_or_default();
        Citation {
            source: self.source_num,
            pdf_filename: self.key.source_document.clone(),
            page: self.key.page,
            text_snippet: snippet(first),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source: usize,
    pub pdf_filename: String,
    pub page: u32,
    pub text_snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub filename: String,
    pub chunk_count: usize,
    pub total_pages: u32,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    pub document_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QueryFilter {
    pub source_document: Option<String>,
}

impl QueryFilter {
    pub fn document(name: impl Into<String>) -> Self {
        Self {
            source_document: Some(name.into()),
        }
    }

    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        self.source_document
            .as_deref()
            .map_or(true, |name| name == metadata.source_document)
    }
}

fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

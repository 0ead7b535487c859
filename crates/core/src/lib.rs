pub mod chunking;
pub mod citations;
pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod stores;
pub mod traits;

pub use chunking::{build_page_chunks, chunk_text, ChunkingConfig, DEFAULT_CHUNK_SIZE};
pub use citations::{cited_sources, reconcile};
pub use classifier::{categorize, classify, QuestionCategory, RetrievalProfile};
pub use config::{
    openrouter_model_id, CredentialStatus, EndpointSettings, PipelineConfig, ProviderKind,
    ProviderSettings,
};
pub use context::{assemble, filter_relevant, AssembledContext, DEFAULT_SIMILARITY_THRESHOLD};
pub use error::{AskError, IndexError, IngestError, ProviderError};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PdfExtractor};
pub use ingest::{discover_pdf_files, document_name};
pub use models::{
    Answer, Chunk, ChunkMetadata, Citation, IndexStatus, IngestReport, QueryFilter,
    RetrievedChunk, Source, SourceKey, StoredChunk,
};
pub use pipeline::{QaPipeline, NO_RELEVANT_INFORMATION};
pub use prompt::{build_prompt, category_instructions, SYSTEM_PROMPT};
pub use providers::{OpenAiChatModel, OpenAiEmbedder};
pub use stores::{cosine_distance, InMemoryIndex, QdrantStore};
pub use traits::{CompletionModel, CompletionRequest, Embedder, VectorIndex};

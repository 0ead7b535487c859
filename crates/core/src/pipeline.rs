use crate::chunking::build_page_chunks;
use crate::citations::reconcile;
use crate::config::PipelineConfig;
use crate::context::assemble;
use crate::error::{AskError, IndexError, IngestError, ProviderError};
use crate::extractor::{PageText, PdfExtractor};
use crate::models::{Answer, IndexStatus, IngestReport, QueryFilter};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::traits::{CompletionModel, CompletionRequest, Embedder, VectorIndex};
use chrono::Utc;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const NO_RELEVANT_INFORMATION: &str =
    "I couldn't find relevant information in the uploaded PDFs to answer your question.";

/// Question answering over a vector index: classify, retrieve, prompt, reconcile.
///
/// The pipeline owns no index and keeps no per-question state, so one value can
/// serve concurrent questions against any number of indexes.
pub struct QaPipeline<E, C> {
    embedder: Arc<E>,
    completion: Arc<C>,
    config: PipelineConfig,
}

impl<E, C> Clone for QaPipeline<E, C> {
    fn clone(&self) -> Self {
        Self {
            embedder: Arc::clone(&self.embedder),
            completion: Arc::clone(&self.completion),
            config: self.config.clone(),
        }
    }
}

impl<E, C> QaPipeline<E, C>
where
    E: Embedder,
    C: CompletionModel,
{
    pub fn new(embedder: E, completion: C) -> Self {
        Self::with_config(embedder, completion, PipelineConfig::default())
    }

    pub fn with_config(embedder: E, completion: C, config: PipelineConfig) -> Self {
        Self {
            embedder: Arc::new(embedder),
            completion: Arc::new(completion),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn ask(
        &self,
        index: &dyn VectorIndex,
        question: &str,
        result_count_override: Option<usize>,
    ) -> Result<Answer, AskError> {
        self.ask_filtered(index, question, result_count_override, None)
            .await
    }

    /// Like [`ask`](Self::ask), restricted to chunks matching `filter`.
    pub async fn ask_filtered(
        &self,
        index: &dyn VectorIndex,
        question: &str,
        result_count_override: Option<usize>,
        filter: Option<&QueryFilter>,
    ) -> Result<Answer, AskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let (category, recommended) = self.config.retrieval.classify(question);
        let result_count = result_count_override.unwrap_or(recommended);
        info!(%category, result_count, "classified question");

        let query_vector = self.embed_query(question).await?;
        let retrieved = index.query(&query_vector, result_count, filter).await?;
        let assembled = assemble(&retrieved, self.config.similarity_threshold);
        debug!(
            retrieved = retrieved.len(),
            sources = assembled.source_count(),
            "assembled context"
        );

        if assembled.is_empty() {
            return Ok(Answer {
                answer: NO_RELEVANT_INFORMATION.to_string(),
                citations: Vec::new(),
            });
        }

        let request = CompletionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: build_prompt(
                question,
                category,
                &assembled.context,
                assembled.source_count(),
            ),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let raw_answer = self
            .bounded("completion request", self.completion.complete(&request))
            .await?;

        Ok(reconcile(&raw_answer, &assembled.citations))
    }

    /// Extracts, chunks, embeds and stores one PDF under `filename`.
    ///
    /// Extraction runs on the blocking pool so large files do not stall
    /// questions served by the same runtime.
    pub async fn ingest(
        &self,
        index: &dyn VectorIndex,
        extractor: Arc<dyn PdfExtractor>,
        path: &Path,
        filename: &str,
    ) -> Result<IngestReport, IngestError> {
        let path = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&path)).await??;
        self.ingest_pages(index, filename, &pages).await
    }

    pub async fn ingest_pages(
        &self,
        index: &dyn VectorIndex,
        filename: &str,
        pages: &[PageText],
    ) -> Result<IngestReport, IngestError> {
        if filename.trim().is_empty() {
            return Err(IngestError::InvalidArgument("filename is empty".to_string()));
        }

        let total_pages = pages.len() as u32;
        let mut chunks = Vec::new();
        for page in pages {
            chunks.extend(build_page_chunks(
                page.number,
                total_pages,
                &page.text,
                &self.config.chunking,
            )?);
        }

        if chunks.is_empty() {
            warn!(filename, total_pages, "no extractable text");
            return Err(IngestError::EmptyExtraction(filename.to_string()));
        }

        let texts = chunks
            .iter()
            .map(|chunk| chunk.text.clone())
            .collect::<Vec<_>>();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.embed_batch_size.max(1)) {
            let vectors = self
                .bounded("embedding request", self.embedder.embed(batch))
                .await?;
            if vectors.len() != batch.len() {
                return Err(ProviderError::Provider(format!(
                    "expected {} embeddings, provider returned {}",
                    batch.len(),
                    vectors.len()
                ))
                .into());
            }
            embeddings.extend(vectors);
        }

        let chunk_count = index.add(&chunks, filename, &embeddings).await?;
        info!(filename, chunk_count, total_pages, "ingested document");

        Ok(IngestReport {
            filename: filename.to_string(),
            chunk_count,
            total_pages,
            ingested_at: Utc::now(),
        })
    }

    pub async fn status(&self, index: &dyn VectorIndex) -> Result<IndexStatus, IndexError> {
        Ok(IndexStatus {
            document_count: index.count().await?,
        })
    }

    pub async fn clear(&self, index: &dyn VectorIndex) -> Result<(), IndexError> {
        index.clear().await?;
        info!("cleared index");
        Ok(())
    }

    async fn embed_query(&self, question: &str) -> Result<Vec<f32>, ProviderError> {
        let texts = [question.to_string()];
        self.bounded("embedding request", self.embedder.embed(&texts))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Provider("no embedding returned for question".to_string()))
    }

    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        let limit = self.config.provider_timeout;
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| ProviderError::Timeout {
                operation: operation.to_string(),
                seconds: limit.as_secs(),
            })?
    }
}

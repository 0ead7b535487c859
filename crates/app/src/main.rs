use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_qa_core::{
    discover_pdf_files, document_name, AskError, ChunkingConfig, CredentialStatus, IngestError,
    LopdfExtractor, OpenAiChatModel, OpenAiEmbedder, PdfExtractor, PipelineConfig, ProviderError,
    ProviderSettings, QaPipeline, QdrantStore, QueryFilter, VectorIndex,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Qdrant collection
    #[arg(long, env = "QDRANT_COLLECTION", default_value = "pdf_documents")]
    qdrant_collection: String,

    /// Dimension of the configured embedding model.
    #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value = "1536")]
    embedding_dimensions: usize,

    /// Timeout for each embedding or completion call, in seconds.
    #[arg(long, default_value = "60")]
    timeout_secs: u64,

    /// Cosine distance at or above which retrieved chunks are dropped.
    #[arg(long, default_value = "0.8")]
    similarity_threshold: f32,

    /// Target chunk size in characters.
    #[arg(long, default_value = "500")]
    chunk_size: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Extract, chunk, embed and store a PDF file or every PDF under a folder.
    Ingest {
        /// PDF file or folder containing PDFs recursively.
        #[arg(long)]
        path: String,
    },
    /// Ask a question and print a cited answer.
    Ask {
        /// Question text
        #[arg(long)]
        question: String,
        /// Override the number of chunks retrieved for this question type.
        #[arg(long)]
        top_k: Option<usize>,
        /// Only retrieve from this document.
        #[arg(long)]
        document: Option<String>,
        /// Chat model for this question, e.g. gpt-4o or claude-3.5-sonnet.
        #[arg(long)]
        model: Option<String>,
        /// Print the answer and citations as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the number of stored chunks and the configured provider.
    Status,
    /// Remove every stored chunk.
    Clear,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            chunking: ChunkingConfig {
                target_size: self.chunk_size,
            },
            similarity_threshold: self.similarity_threshold,
            provider_timeout: Duration::from_secs(self.timeout_secs),
            ..PipelineConfig::default()
        }
    }

    fn pipeline(
        &self,
        model: Option<&str>,
    ) -> anyhow::Result<QaPipeline<OpenAiEmbedder, OpenAiChatModel>> {
        let mut settings = ProviderSettings::from_env().context("loading provider configuration")?;
        if let Some(model) = model {
            settings.chat.model = settings.chat_model_id(model);
        }
        let timeout = Duration::from_secs(self.timeout_secs);
        let embedder = OpenAiEmbedder::new(&settings.embeddings, timeout)?;
        let chat = OpenAiChatModel::new(&settings.chat, timeout)?;

        info!(
            provider = ?settings.kind,
            chat_model = chat.model_name(),
            embedding_model = embedder.model_name(),
            "providers configured"
        );

        Ok(QaPipeline::with_config(embedder, chat, self.pipeline_config()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let store = QdrantStore::new(&cli.qdrant_url, &cli.qdrant_collection, cli.embedding_dimensions);

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "pdf-qa boot"
    );

    match &cli.command {
        Command::Ingest { path } => {
            let pipeline = cli.pipeline(None)?;
            let extractor: Arc<dyn PdfExtractor> = Arc::new(LopdfExtractor);
            store.ensure_collection().await?;

            let files = discover_pdf_files(Path::new(path));
            if files.is_empty() {
                anyhow::bail!("no pdf files found at {path}");
            }

            let mut total_chunks = 0;
            for file in files {
                let filename = document_name(&file)?;
                match pipeline
                    .ingest(&store, Arc::clone(&extractor), &file, &filename)
                    .await
                {
                    Ok(report) => {
                        info!(filename = %report.filename, chunks = report.chunk_count, pages = report.total_pages, "ingested");
                        total_chunks += report.chunk_count;
                    }
                    Err(error @ (IngestError::EmptyExtraction(_) | IngestError::PdfParse(_))) => {
                        warn!(path = %file.display(), reason = %error, "skipped pdf");
                    }
                    Err(IngestError::Provider(error)) if error.is_authentication() => {
                        return Err(credential_hint(error));
                    }
                    Err(error) => return Err(error.into()),
                }
            }

            println!(
                "{} chunks ingested at {} (collection now holds {})",
                total_chunks,
                Utc::now().to_rfc3339(),
                store.count().await?
            );
        }
        Command::Ask {
            question,
            top_k,
            document,
            model,
            json,
        } => {
            let pipeline = cli.pipeline(model.as_deref())?;
            let filter = document.as_ref().map(QueryFilter::document);

            let answer = match pipeline
                .ask_filtered(&store, question, *top_k, filter.as_ref())
                .await
            {
                Ok(answer) => answer,
                Err(AskError::Provider(error)) if error.is_authentication() => {
                    return Err(credential_hint(error));
                }
                Err(error) => return Err(error.into()),
            };

            if *json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}\n", answer.answer);
                for citation in &answer.citations {
                    println!(
                        "[Source {}] {} page {}\n  {}",
                        citation.source, citation.pdf_filename, citation.page, citation.text_snippet
                    );
                }
            }
        }
        Command::Status => {
            let credentials = CredentialStatus::from_env();
            println!("document_count: {}", store.count().await?);
            println!("has_api_key: {}", credentials.has_api_key);
            println!("using_openai: {}", credentials.using_openai);
            println!("using_openrouter: {}", credentials.using_openrouter);
            println!("force_openrouter: {}", credentials.force_openrouter);
        }
        Command::Clear => {
            store.clear().await?;
            println!("all documents cleared");
        }
    }

    Ok(())
}

fn credential_hint(error: ProviderError) -> anyhow::Error {
    anyhow::anyhow!("{error}\ncheck OPENAI_API_KEY / OPENROUTER_API_KEY and try again")
}

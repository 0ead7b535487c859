use crate::chunking::ChunkingConfig;
use crate::classifier::RetrievalProfile;
use crate::context::DEFAULT_SIMILARITY_THRESHOLD;
use crate::error::ProviderError;
use serde::Serialize;
use std::time::Duration;
use url::Url;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

const OPENROUTER_REFERER: &str = "http://localhost:8000";
const OPENROUTER_TITLE: &str = "PDF RAG Q&A System";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    OpenRouter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub extra_headers: Vec<(String, String)>,
}

/// Which provider serves completions and which serves embeddings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub chat: EndpointSettings,
    pub embeddings: EndpointSettings,
}

impl ProviderSettings {
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves providers from `OPENAI_API_KEY`, `OPENROUTER_API_KEY` and
    /// `FORCE_OPENROUTER`, with optional `LLM_MODEL`, `EMBEDDING_MODEL`,
    /// `OPENAI_BASE_URL` and `OPENROUTER_BASE_URL` overrides.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let openai_key = non_empty("OPENAI_API_KEY");
        let openrouter_key = non_empty("OPENROUTER_API_KEY");
        let force_openrouter = non_empty("FORCE_OPENROUTER")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        let openai_url = validated_url(non_empty("OPENAI_BASE_URL"), OPENAI_BASE_URL)?;
        let openrouter_url = validated_url(non_empty("OPENROUTER_BASE_URL"), OPENROUTER_BASE_URL)?;

        let kind = match (force_openrouter, &openai_key, &openrouter_key) {
            (true, _, None) => {
                return Err(ProviderError::Configuration(
                    "OPENROUTER_API_KEY is required when FORCE_OPENROUTER=true".to_string(),
                ))
            }
            (true, _, Some(_)) => ProviderKind::OpenRouter,
            (false, Some(_), _) => ProviderKind::OpenAi,
            (false, None, Some(_)) => ProviderKind::OpenRouter,
            (false, None, None) => {
                return Err(ProviderError::Configuration(
                    "no API key found; set OPENAI_API_KEY or OPENROUTER_API_KEY".to_string(),
                ))
            }
        };

        let openai = |api_key: String, model: String| EndpointSettings {
            base_url: openai_url.clone(),
            api_key,
            model,
            extra_headers: Vec::new(),
        };
        let openrouter = |api_key: String, model: String| EndpointSettings {
            base_url: openrouter_url.clone(),
            api_key,
            model,
            extra_headers: vec![
                ("HTTP-Referer".to_string(), OPENROUTER_REFERER.to_string()),
                ("X-Title".to_string(), OPENROUTER_TITLE.to_string()),
            ],
        };

        let settings = match kind {
            ProviderKind::OpenAi => {
                let key = openai_key.unwrap_or_default();
                Self {
                    kind,
                    chat: openai(
                        key.clone(),
                        non_empty("LLM_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
                    ),
                    embeddings: openai(
                        key,
                        non_empty("EMBEDDING_MODEL")
                            .unwrap_or_else(|| "text-embedding-3-small".to_string()),
                    ),
                }
            }
            ProviderKind::OpenRouter => {
                let key = openrouter_key.unwrap_or_default();
                let embedding_model = non_empty("EMBEDDING_MODEL")
                    .unwrap_or_else(|| "text-embedding-ada-002".to_string());
                // OpenRouter's embedding support is patchy; prefer OpenAI when a key exists.
                let embeddings = match openai_key {
                    Some(openai_key) => openai(openai_key, embedding_model),
                    None => openrouter(key.clone(), embedding_model),
                };
                Self {
                    kind,
                    chat: openrouter(
                        key,
                        non_empty("LLM_MODEL").unwrap_or_else(|| "openai/gpt-3.5-turbo".to_string()),
                    ),
                    embeddings,
                }
            }
        };

        Ok(settings)
    }

    /// Chat model id for a caller-requested model name, in the form the
    /// selected provider expects.
    pub fn chat_model_id(&self, requested: &str) -> String {
        match self.kind {
            ProviderKind::OpenAi => requested.trim().to_string(),
            ProviderKind::OpenRouter => openrouter_model_id(requested),
        }
    }
}

/// Maps a bare model name onto OpenRouter's `vendor/model` ids. Names that
/// already carry a vendor prefix are kept, except that `claude-3.5` is
/// spelled `claude-3-5` there.
pub fn openrouter_model_id(name: &str) -> String {
    let name = name.trim();
    if name.contains('/') {
        return name.replace("claude-3.5", "claude-3-5");
    }
    if name.starts_with("claude") {
        return format!("anthropic/{}", name.replace("3.5", "3-5"));
    }

    let vendor = if name.starts_with("llama") {
        "meta"
    } else if name.starts_with("gemini") {
        "google"
    } else {
        "openai"
    };
    format!("{vendor}/{name}")
}

/// Which credentials are present and which provider they select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub has_api_key: bool,
    pub using_openai: bool,
    pub using_openrouter: bool,
    pub force_openrouter: bool,
}

impl CredentialStatus {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).is_some_and(|value| !value.trim().is_empty());
        let kind = ProviderSettings::from_lookup(&lookup)
            .ok()
            .map(|settings| settings.kind);

        Self {
            has_api_key: present("OPENAI_API_KEY") || present("OPENROUTER_API_KEY"),
            using_openai: kind == Some(ProviderKind::OpenAi),
            using_openrouter: kind == Some(ProviderKind::OpenRouter),
            force_openrouter: lookup("FORCE_OPENROUTER")
                .is_some_and(|value| value.trim().eq_ignore_ascii_case("true")),
        }
    }
}

fn validated_url(value: Option<String>, default: &str) -> Result<String, ProviderError> {
    let raw = value.unwrap_or_else(|| default.to_string());
    Url::parse(&raw)
        .map_err(|error| ProviderError::Configuration(format!("invalid base url {raw}: {error}")))?;
    Ok(raw)
}

/// Tunables for one question-answering pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub retrieval: RetrievalProfile,
    pub chunking: ChunkingConfig,
    pub similarity_threshold: f32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub provider_timeout: Duration,
    pub embed_batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalProfile::default(),
            chunking: ChunkingConfig::default(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            temperature: 0.7,
            max_tokens: 1_000,
            provider_timeout: Duration::from_secs(60),
            embed_batch_size: 64,
        }
    }
}

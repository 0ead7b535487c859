//! OpenAI-compatible embedding and chat completion clients.
//!
//! OpenRouter speaks the same protocol, so both providers share these types and
//! differ only in [`EndpointSettings`].

use super::HttpEndpoint;
use crate::config::EndpointSettings;
use crate::error::ProviderError;
use crate::traits::{CompletionModel, CompletionRequest, Embedder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    endpoint: HttpEndpoint,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(settings: &EndpointSettings, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: HttpEndpoint::new(settings, timeout)?,
            model: settings.model.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let response: EmbeddingResponse = self
            .endpoint
            .post_json("embedding request", "embeddings", &request)
            .await?;

        order_embeddings(response.data, texts.len())
    }
}

/// Restores input order when the provider reports indices, and checks that
/// every input got a vector.
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>, ProviderError> {
    if data.len() != expected {
        return Err(ProviderError::Provider(format!(
            "expected {expected} embeddings, provider returned {}",
            data.len()
        )));
    }

    if data.iter().all(|item| item.index.is_some()) {
        data.sort_by_key(|item| item.index);
    }

    Ok(data.into_iter().map(|item| item.embedding).collect())
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiChatModel {
    endpoint: HttpEndpoint,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(settings: &EndpointSettings, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: HttpEndpoint::new(settings, timeout)?,
            model: settings.model.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionModel for OpenAiChatModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response: ChatResponse = self
            .endpoint
            .post_json("completion request", "chat/completions", &body)
            .await?;

        first_reply(response)
    }
}

fn first_reply(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::Provider("completion response has no message content".to_string()))
}

//! HTTP text-completion backends.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{LlmConfig, ProviderId, RetryPolicy};
use crate::error::CompletionError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_MODEL: &str = "gemini-2.0-flash";
const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OPENAI_MODEL: &str = "gpt-3.5-turbo";
const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 500;

/// Opaque text-completion capability used by the decision provider.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, CompletionError>;
}

/// Completion client for the configured provider, with retries on transient
/// failures.
pub struct LlmClient {
    http: Client,
    provider: ProviderId,
    api_key: Option<String>,
    base_url: String,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, CompletionError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(config.provider).to_string());

        Ok(Self {
            http,
            provider: config.provider,
            api_key: config.api_key().map(str::to_string),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
        })
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn request_once(
        &self,
        api_key: &str,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, CompletionError> {
        match self.provider {
            ProviderId::Gemini => self.gemini(api_key, prompt, system_instruction).await,
            ProviderId::OpenAi => self.openai(api_key, prompt, system_instruction).await,
        }
    }

    async fn gemini(
        &self,
        api_key: &str,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, CompletionError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent::text(prompt)],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
            system_instruction: system_instruction.map(GeminiContent::text),
        };

        let response = self
            .http
            .post(format!(
                "{}/v1beta/models/{GEMINI_MODEL}:generateContent",
                self.base_url
            ))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        let data: GeminiResponse = response.json().await?;

        data.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(CompletionError::EmptyCompletion)
    }

    async fn openai(
        &self,
        api_key: &str,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, CompletionError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_instruction {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let body = ChatRequest {
            model: OPENAI_MODEL,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        let data: ChatResponse = response.json().await?;

        data.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(CompletionError::EmptyCompletion)
    }
}

#[async_trait]
impl TextCompletion for LlmClient {
    async fn complete(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::MissingApiKey(self.provider.to_string()))?;

        let mut attempt = 0;
        loop {
            match self.request_once(api_key, prompt, system_instruction).await {
                Ok(text) => {
                    debug!(provider = %self.provider, attempt, "completion received");
                    return Ok(text);
                }
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(
                        provider = %self.provider,
                        attempt,
                        max = self.retry.max_retries,
                        error = %err,
                        "transient completion failure, retrying"
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn default_base_url(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Gemini => GEMINI_BASE_URL,
        ProviderId::OpenAi => OPENAI_BASE_URL,
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CompletionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CompletionError::Status {
        status: status.as_u16(),
        body,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
    #[serde(rename = "system_instruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn text(text: &str) -> Self {
        Self {
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

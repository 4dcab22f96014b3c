//! Chat-completion client (OpenRouter-compatible API).

use crate::config::LlmConfig;
use crate::prompts;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(
        "no chat API key configured, set [llm].api_key in Config.toml or OPENROUTER_API_KEY"
    )]
    MissingCredential,

    #[error("chat API request failed with status {status}: {message}")]
    RemoteCallFailed { status: u16, message: String },

    #[error("no choices returned from chat API")]
    NoChoices,

    #[error("chat API transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Self {
        ChatClient {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn api_key(&self) -> Result<&str, ChatError> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ChatError::MissingCredential),
        }
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.config.endpoint);

        debug!("Requesting chat completion from {url}");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&ChatRequest {
                model: &self.config.model,
                messages,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .map(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());

            return Err(ChatError::RemoteCallFailed {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ChatError::NoChoices)
    }

    /// Generates a structured study note for a topic
    pub async fn generate_note(&self, topic: &str) -> Result<String, ChatError> {
        self.complete(&[
            ChatMessage::system(prompts::NOTE_PROMPT),
            ChatMessage::user(topic),
        ])
        .await
    }

    /// Turns note content into a plain-text two-speaker dialogue
    pub async fn generate_conversation(&self, content: &str) -> Result<String, ChatError> {
        self.complete(&[ChatMessage::user(format!(
            "{}{content}",
            prompts::PODCAST_PROMPT
        ))])
        .await
    }

    /// Generates a self-contained HTML infographic for note content
    pub async fn generate_infographic(&self, content: &str) -> Result<String, ChatError> {
        self.complete(&[ChatMessage::user(format!(
            "{}{content}",
            prompts::INFOGRAPHIC_PROMPT
        ))])
        .await
    }
}

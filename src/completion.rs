// src/completion.rs
//! Chat-completion client for an OpenAI-compatible endpoint (OpenRouter by default)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_log;
use crate::config::CustomizerConfig;
use crate::error::CustomizeError;

const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";
const APP_TITLE: &str = "Resume Customizer CLI";
const APP_REFERER: &str = "https://github.com/resume-customizer/resume-customizer";

/// Anything that turns a prompt into a reply. One attempt, no retries.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CustomizeError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct CompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl CompletionClient {
    /// Fails with `AuthError` before any network activity when the key is absent.
    pub fn new(config: &CustomizerConfig) -> Result<Self, CustomizeError> {
        let api_key = config.require_api_key()?.to_string();

        let client = Client::builder().build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, CHAT_COMPLETIONS_ENDPOINT)
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CustomizeError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let url = self.endpoint();
        app_log!(info, "Sending completion request to {} (model {})", url, self.model);
        app_log!(trace, "Prompt: {}", prompt);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", APP_REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        app_log!(debug, "Completion response status: {}", status);

        let response_text = response.text().await?;

        if !status.is_success() {
            app_log!(error, "AI service error {}: {}", status, response_text);
            return Err(CustomizeError::Remote {
                status: status.as_u16(),
                message: response_text,
            });
        }

        let chat: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            CustomizeError::Remote {
                status: status.as_u16(),
                message: format!("unexpected response payload ({}): {}", e, response_text),
            }
        })?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| CustomizeError::Remote {
                status: status.as_u16(),
                message: "response contained no message content".to_string(),
            })?;

        app_log!(info, "Received {} characters from the AI service", content.len());
        Ok(content)
    }
}

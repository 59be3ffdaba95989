//! Chat-completion client used for generation and fit analysis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A generative-text collaborator.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, AppError>;

    /// Whether credentials are present. An unconfigured client fails every call.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Client for an OpenAI-compatible chat-completions endpoint (Groq by default).
#[derive(Debug, Clone)]
pub struct ChatClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl ChatClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
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
struct ChatCompletionResponse {
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

#[async_trait]
impl TextCompletion for ChatClient {
    async fn complete(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigurationMissing("GROQ_API_KEY".to_string()))?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature,
            max_tokens: max_output_tokens,
        };

        let resp = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "Completion API returned {status}: {body}"
            )));
        }

        let completion: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse response: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        tracing::debug!(model = %self.model, chars = content.len(), "Completion received");
        Ok(content)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

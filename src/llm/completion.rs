//! Stateless chat-completion client
//!
//! One request/response round trip per call. Used for direct generation on
//! tiers without a configured assistant, and by the router for
//! classification calls.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single chat-completion request
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Model identifier on the wire
    pub model: &'a str,
    /// Optional system instruction. Reasoning models reject the system
    /// role; callers fold instructions into the user message instead.
    pub system: Option<&'a str>,
    /// User message content
    pub user: &'a str,
    /// Response length cap
    pub max_tokens: u32,
    /// Sampling temperature; `None` uses the service default
    pub temperature: Option<f32>,
}

/// Client for a chat-completions endpoint
pub struct CompletionClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CompletionClient {
    /// Create a new completion client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for chat completions".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        })
    }

    /// Run one completion round trip and return the reply text, trimmed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Generation` on a non-success status or an empty
    /// choice list; transport failures surface as `Error::Http`.
    pub async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: request.user,
        });

        let body = ChatCompletionRequest {
            model: request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        tracing::debug!(
            model = request.model,
            max_tokens = request.max_tokens,
            "sending chat completion"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat completion error");
            return Err(Error::Generation(format!(
                "chat completion error {status}: {body}"
            )));
        }

        let result: ChatCompletionResponse = response.json().await?;

        let content = result
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| Error::Generation("no choices in completion response".to_string()))?;

        Ok(content.trim().to_string())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

//! Stateful assistant-thread client
//!
//! Drives the threads API: create a thread, post the user message, start a
//! run, poll run status until it reaches a terminal state, then fetch the
//! newest assistant message. Polling is bounded; a run that never settles
//! surfaces `GenerationTimeout` instead of hanging the turn forever.

use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Lifecycle of an assistant run as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Accepted, not yet started
    Queued,
    /// Executing
    InProgress,
    /// Terminal success
    Completed,
    /// Terminal failure (failed, cancelled, or expired)
    Failed,
    /// Unrecognized status string; treated as still pending
    Other,
}

/// Map a wire status string onto the run lifecycle
#[must_use]
pub fn parse_run_status(status: &str) -> RunStatus {
    match status {
        "queued" => RunStatus::Queued,
        "in_progress" => RunStatus::InProgress,
        "completed" => RunStatus::Completed,
        "failed" | "cancelled" | "cancelling" | "expired" | "incomplete" => RunStatus::Failed,
        _ => RunStatus::Other,
    }
}

/// Client for the stateful assistant-thread endpoints
pub struct AssistantClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl AssistantClient {
    /// Create a new assistant client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(
        api_key: String,
        base_url: String,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "API key required for assistant threads".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            poll_interval,
            max_poll_attempts,
        })
    }

    /// Post `user_message` to a fresh thread, run `assistant_id` on it, and
    /// return the assistant's reply text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Generation` on any non-success response or a failed
    /// run, `Error::GenerationTimeout` when the run does not reach a
    /// terminal state within the poll budget.
    pub async fn run(&self, assistant_id: &str, user_message: &str) -> Result<String> {
        let thread_id = self.create_thread().await?;
        tracing::debug!(thread = %thread_id, "thread created");

        self.post_message(&thread_id, user_message).await?;

        let run_id = self.create_run(&thread_id, assistant_id).await?;
        tracing::debug!(thread = %thread_id, run = %run_id, "run started");

        self.wait_for_run(&thread_id, &run_id).await?;

        self.latest_assistant_message(&thread_id).await
    }

    async fn create_thread(&self) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/threads", self.base_url))
            .headers(self.headers())
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let object: IdObject = check(response, "creating thread").await?;
        Ok(object.id)
    }

    async fn post_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/threads/{thread_id}/messages", self.base_url))
            .headers(self.headers())
            .json(&serde_json::json!({ "role": "user", "content": content }))
            .send()
            .await?;

        check::<IdObject>(response, "posting message").await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/threads/{thread_id}/runs", self.base_url))
            .headers(self.headers())
            .json(&serde_json::json!({ "assistant_id": assistant_id }))
            .send()
            .await?;

        let object: IdObject = check(response, "starting run").await?;
        Ok(object.id)
    }

    /// Poll run status until terminal, bounded by `max_poll_attempts`.
    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<()> {
        for attempt in 0..self.max_poll_attempts {
            let response = self
                .client
                .get(format!(
                    "{}/threads/{thread_id}/runs/{run_id}",
                    self.base_url
                ))
                .headers(self.headers())
                .send()
                .await?;

            let run: RunObject = check(response, "checking run status").await?;

            match parse_run_status(&run.status) {
                RunStatus::Completed => {
                    tracing::debug!(run = %run_id, attempts = attempt + 1, "run completed");
                    return Ok(());
                }
                RunStatus::Failed => {
                    return Err(Error::Generation(format!(
                        "run {run_id} ended with status {}",
                        run.status
                    )));
                }
                RunStatus::Queued | RunStatus::InProgress | RunStatus::Other => {
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        Err(Error::GenerationTimeout(self.max_poll_attempts))
    }

    /// Fetch the newest assistant message from the thread.
    async fn latest_assistant_message(&self, thread_id: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/threads/{thread_id}/messages", self.base_url))
            .headers(self.headers())
            .send()
            .await?;

        let list: MessageList = check(response, "retrieving messages").await?;

        // The list is newest-first; take the most recent assistant message
        let reply = list
            .data
            .iter()
            .find(|m| m.role == "assistant")
            .map(|m| {
                m.content
                    .iter()
                    .filter_map(|part| part.text.as_ref())
                    .map(|t| t.value.as_str())
                    .collect::<String>()
            })
            .ok_or_else(|| Error::Generation("no assistant message in thread".to_string()))?;

        Ok(reply.trim().to_string())
    }

    fn headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(auth) = format!("Bearer {}", self.api_key).parse() {
            headers.insert(reqwest::header::AUTHORIZATION, auth);
        }
        if let Ok(beta) = "assistants=v2".parse() {
            headers.insert("OpenAI-Beta", beta);
        }
        headers
    }
}

/// Decode a response, converting non-success statuses into `Generation`
/// errors tagged with the step that failed.
async fn check<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    step: &str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, step, "assistant API error");
        return Err(Error::Generation(format!("{step}: {status}: {body}")));
    }

    Ok(response.json().await?)
}

#[derive(Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Deserialize)]
struct RunObject {
    status: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<TextValue>,
}

#[derive(Deserialize)]
struct TextValue {
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_parsing() {
        assert_eq!(parse_run_status("queued"), RunStatus::Queued);
        assert_eq!(parse_run_status("in_progress"), RunStatus::InProgress);
        assert_eq!(parse_run_status("completed"), RunStatus::Completed);
        assert_eq!(parse_run_status("failed"), RunStatus::Failed);
        assert_eq!(parse_run_status("cancelled"), RunStatus::Failed);
        assert_eq!(parse_run_status("expired"), RunStatus::Failed);
        assert_eq!(parse_run_status("requires_action"), RunStatus::Other);
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let result = AssistantClient::new(
            String::new(),
            "https://example.invalid".to_string(),
            Duration::from_secs(1),
            300,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn exhausted_poll_budget_times_out() {
        // A zero budget exhausts before the first status check, so no
        // network access happens
        let client = AssistantClient::new(
            "test-key".to_string(),
            "http://127.0.0.1:1".to_string(),
            Duration::from_millis(1),
            0,
        )
        .unwrap();

        let result = client.wait_for_run("thread_x", "run_x").await;
        assert!(matches!(result, Err(Error::GenerationTimeout(0))));
    }

    #[test]
    fn message_content_concatenates_text_parts() {
        let json = r#"{
            "data": [
                {"role": "assistant", "content": [
                    {"type": "text", "text": {"value": "Hello "}},
                    {"type": "image_file"},
                    {"type": "text", "text": {"value": "world"}}
                ]},
                {"role": "user", "content": [{"type": "text", "text": {"value": "hi"}}]}
            ]
        }"#;
        let list: MessageList = serde_json::from_str(json).unwrap();
        let reply: String = list.data[0]
            .content
            .iter()
            .filter_map(|p| p.text.as_ref())
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(reply, "Hello world");
    }
}

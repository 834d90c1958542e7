//! External LLM client.
//!
//! Every call site treats a failure here as a signal to fall back to a
//! deterministic local path, so all errors surface as `Err` and nothing in
//! this module panics or retries.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::LlmConfig;

/// Seam for text generation. The chat service and analysis extractor only
/// depend on this trait, so tests swap in scripted implementations.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String>;
}

/// OpenAI-compatible chat-completions client.
pub struct HttpTextGenerator {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_tokens: usize,
    client: Client,
}

impl HttpTextGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        tracing::info!(
            endpoint = %config.endpoint,
            model = %config.model,
            "Creating HttpTextGenerator (connect_timeout=15s)"
        );

        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
            client,
        })
    }

    /// Parse a response body as JSON, returning a clear error if the server
    /// returned an HTML error page instead.
    async fn parse_json_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response body from {}: {}", endpoint, e))?;

        let trimmed = body.trim_start();
        if trimmed.starts_with('<') || trimmed.starts_with("<!") {
            let preview: String = trimmed.chars().take(200).collect();
            return Err(anyhow!(
                "Endpoint {} returned HTML instead of JSON (HTTP {}). Response: {}",
                endpoint,
                status,
                preview
            ));
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let preview: String = body.chars().take(300).collect();
            anyhow!(
                "Failed to parse JSON from {} (HTTP {}): {}. Response body: {}",
                endpoint,
                status,
                e,
                preview
            )
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let request = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
        });

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| anyhow!("Request to {} failed: {}", self.endpoint, e))?;

        let result: ChatCompletionResponse =
            Self::parse_json_response(response, &self.endpoint).await?;

        result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow!("Endpoint {} returned no choices", self.endpoint))
    }
}

#[cfg(test)]
pub mod testing {
    //! Scripted generators for tests.

    use super::*;
    use parking_lot::Mutex;

    /// Returns canned responses in order, then errors.
    pub struct ScriptedGenerator {
        responses: Mutex<Vec<Result<String, String>>>,
    }

    impl ScriptedGenerator {
        pub fn new(responses: Vec<Result<String, String>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }

        /// A generator whose every call fails, for fallback-path tests.
        pub fn always_failing() -> Self {
            Self::new(vec![])
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str, _system_prompt: Option<&str>) -> Result<String> {
            match self.responses.lock().pop() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(anyhow!(message)),
                None => Err(anyhow!("scripted generator exhausted")),
            }
        }
    }
}

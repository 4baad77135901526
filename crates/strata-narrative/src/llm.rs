use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strata_core::{LlmConfig, StrataError};
use tracing::debug;

use crate::Narrator;

/// Upper bound on generated tokens; narratives are a few short paragraphs.
const MAX_TOKENS: u32 = 1000;

/// A message in a chat conversation with the LLM.
///
/// # Examples
///
/// ```
/// use strata_narrative::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("Why does this file exist?");
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use strata_narrative::llm::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint:
/// OpenAI, Ollama, vLLM, LiteLLM, etc.
///
/// # Examples
///
/// ```
/// use strata_core::LlmConfig;
/// use strata_narrative::llm::LlmClient;
///
/// let config = LlmConfig {
///     api_key: Some("test-key".into()),
///     ..LlmConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// assert_eq!(client.model(), "gpt-4o");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a new LLM client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Llm`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, StrataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| StrataError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Build a client only when narration is enabled and reachable.
    ///
    /// Returns `None` when `enabled` is off, or when the default OpenAI
    /// endpoint would be used without an API key. Callers then use the
    /// rule-based fallback text.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::LlmConfig;
    /// use strata_narrative::llm::LlmClient;
    ///
    /// assert!(LlmClient::from_config(&LlmConfig::default()).unwrap().is_none());
    ///
    /// let local = LlmConfig {
    ///     base_url: Some("http://localhost:11434".into()),
    ///     ..LlmConfig::default()
    /// };
    /// assert!(LlmClient::from_config(&local).unwrap().is_some());
    /// ```
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, StrataError> {
        if !config.enabled || (config.api_key.is_none() && config.base_url.is_none()) {
            return Ok(None);
        }
        Self::new(config).map(Some)
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a chat completion request and return the text response.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Llm`] on HTTP errors or response parsing failures.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, StrataError> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com");
        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": 0.2,
            "max_tokens": MAX_TOKENS,
        });

        debug!(%url, model = %self.config.model, "requesting narrative");
        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| StrataError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(StrataError::Llm(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StrataError::Llm(format!("failed to parse response: {e}")))?;

        extract_content(&response_body)
    }
}

fn extract_content(response_body: &serde_json::Value) -> Result<String, StrataError> {
    response_body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| StrataError::Llm(format!("unexpected response structure: {response_body}")))
}

#[async_trait]
impl Narrator for LlmClient {
    async fn narrate(&self, messages: &[ChatMessage]) -> Result<String, StrataError> {
        self.chat(messages).await
    }
}

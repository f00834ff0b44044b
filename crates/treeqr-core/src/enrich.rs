//! Narrative descriptions from a chat-completion model
//!
//! The tree introduces itself: a fixed botanist/storyteller persona plus a request to
//! speak as the named tree. Every call is a fresh generation; nothing is cached and
//! nothing is retried.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::GenerationConfig;
use crate::error::{Error, GenerationFailure, Result};

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "google/gemma-3-4b-it:free";

const SYSTEM_PROMPT: &str = "You are an expert botanist and storyteller. When asked, respond as if you are the tree speaking about yourself in a friendly, informative tone.";

/// Chat message in the OpenAI-compatible wire format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Request body: model and messages only, sampling left at service defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// The user turn asking `subject_name` to tell its own story
pub fn narrative_prompt(subject_name: &str) -> String {
    format!(
        "Introduce yourself as the {} tree. Share your characteristics, origin, importance, and something interesting about you as if you're telling your own story.",
        subject_name
    )
}

/// Generates first-person tree descriptions
#[derive(Clone)]
pub struct DescriptionEnricher {
    http: Client,
    config: GenerationConfig,
}

impl DescriptionEnricher {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn request_body(&self, subject_name: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::new("system", SYSTEM_PROMPT),
                ChatMessage::new("user", narrative_prompt(subject_name)),
            ],
        }
    }

    /// Generate a description for `subject_name`.
    ///
    /// Exactly one request is made. Transport errors, non-2xx statuses, malformed
    /// bodies and empty choice lists all come back as [`Error::GenerationFailed`].
    #[instrument(skip(self), fields(model = %self.config.model))]
    pub async fn enrich(&self, subject_name: &str) -> Result<String> {
        let body = self.request_body(subject_name);
        debug!(endpoint = %self.config.endpoint, "POST chat completion");

        let mut req = self
            .http
            .post(&self.config.endpoint)
            .header("content-type", "application/json");
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.json(&body).send().await.map_err(|e| {
            error!(error = %e, "Chat completion request failed");
            GenerationFailure::Transport(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!(%status, body = %text, "Chat completion error");
            return Err(GenerationFailure::Status(status.as_u16()).into());
        }

        let parsed: ChatResponse = resp.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse chat completion");
            GenerationFailure::Decode(e.to_string())
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(GenerationFailure::NoChoices)?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

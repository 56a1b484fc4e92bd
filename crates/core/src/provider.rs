//! Provider trait: the abstraction over the upstream chat-completion API.
//!
//! A Provider takes an assembled prompt and returns the model's answer text.
//! The HTTP gateway only ever talks to `dyn Provider`, which keeps the
//! upstream swappable and lets tests script answers and failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::prompt::PromptMessage;

/// A single chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "google/gemini-2.5-flash")
    pub model: String,

    /// The assembled prompt
    pub messages: Vec<PromptMessage>,

    /// Temperature (0.0 = deterministic, 2.0 = most random)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

/// The answer produced by the first completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Answer text
    pub content: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "ai-gateway").
    fn name(&self) -> &str;

    /// Whether the provider holds the credential it needs.
    ///
    /// Checked before every call so a missing key fails without touching
    /// the network.
    fn is_configured(&self) -> bool {
        true
    }

    /// Send a request and get the complete answer.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

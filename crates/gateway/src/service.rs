//! The chat request handler behind `POST /chat-with-pdf`.
//!
//! One invocation: check the credential, assemble the prompt, make one
//! upstream call under a deadline, extract citations from the answer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docchat_config::AppConfig;
use docchat_core::error::{Error, ProviderError, Result};
use docchat_core::{
    Answerer, ChatReply, ChatRequest, CitationSet, CompletionRequest, Provider, prompt,
};
use tracing::{debug, info, warn};

/// Per-call settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub system_instruction: String,
    /// Deadline for the whole question, retries included.
    pub timeout: Duration,
}

impl ChatSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_instruction: config.system_instruction().to_string(),
            timeout: config.request_deadline(),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Answers questions about a document through the upstream provider.
///
/// Holds only immutable state, so one instance is shared by every request.
pub struct ChatService {
    provider: Arc<dyn Provider>,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(provider: Arc<dyn Provider>, settings: ChatSettings) -> Self {
        Self { provider, settings }
    }

    /// Build the provider stack and settings from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            docchat_providers::build_from_config(config),
            ChatSettings::from_config(config),
        )
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    async fn call_upstream(&self, request: CompletionRequest) -> Result<String> {
        let deadline = self.settings.timeout;
        match tokio::time::timeout(deadline, self.provider.complete(request)).await {
            Ok(Ok(response)) => {
                if let Some(usage) = response.usage {
                    debug!(
                        model = %response.model,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "Upstream usage"
                    );
                }
                Ok(response.content)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ProviderError::Timeout(format!(
                "no answer within {}s",
                deadline.as_secs()
            ))
            .into()),
        }
    }
}

#[async_trait]
impl Answerer for ChatService {
    async fn answer(&self, request: ChatRequest) -> Result<ChatReply> {
        if !self.provider.is_configured() {
            return Err(Error::config(
                "AI gateway API key is not configured (set DOCCHAT_API_KEY)",
            ));
        }

        if request.question.trim().is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".into()));
        }

        if !request.document.is_empty() && !request.document.is_pdf_data_url() {
            warn!(
                payload_bytes = request.document.len(),
                "Document payload is not a PDF data URL"
            );
        }

        info!(
            question_len = request.question.len(),
            history = request.conversation_history.len(),
            "Answering question"
        );

        let messages = prompt::assemble(
            &self.settings.system_instruction,
            &request.conversation_history,
            &request.question,
        );
        let answer = self
            .call_upstream(CompletionRequest {
                model: self.settings.model.clone(),
                messages,
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
            })
            .await?;

        let mut citations = CitationSet::extract(&answer);
        if let Some(page_count) = request.page_count {
            let found = citations.len();
            citations = citations.within(page_count);
            if citations.len() < found {
                debug!(
                    page_count,
                    dropped = found - citations.len(),
                    "Dropped citations past the last page"
                );
            }
        }

        info!(citations = %citations, "Answer ready");
        Ok(ChatReply { answer, citations })
    }
}

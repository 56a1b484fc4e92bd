//! Request and reply of one chat turn, plus the [`Answerer`] seam.
//!
//! These are also the JSON bodies of `POST /chat-with-pdf`, so field names
//! follow the browser client (`pdfBase64`, `conversationHistory`).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::citation::CitationSet;
use crate::document::DocumentPayload;
use crate::error::Result;
use crate::prompt::HistoryEntry;

/// One question about a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: String,

    /// Passed through untouched; the model never sees it.
    #[serde(rename = "pdfBase64", default)]
    pub document: DocumentPayload,

    #[serde(default)]
    pub conversation_history: Vec<HistoryEntry>,

    /// Page count reported by the viewer, used to drop impossible citations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            document: DocumentPayload::default(),
            conversation_history: Vec::new(),
            page_count: None,
        }
    }
}

/// The model's answer and the pages it cites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    pub citations: CitationSet,
}

/// Something that can answer a [`ChatRequest`].
///
/// Implemented by the gateway's chat service; a [`crate::session::ChatSession`]
/// drives any implementation turn by turn.
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(&self, request: ChatRequest) -> Result<ChatReply>;
}

#[async_trait]
impl<T: Answerer + ?Sized> Answerer for Arc<T> {
    async fn answer(&self, request: ChatRequest) -> Result<ChatReply> {
        (**self).answer(request).await
    }
}

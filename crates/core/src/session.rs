//! Client-side chat session over one document.
//!
//! The session owns the conversation log and sends the log as history with
//! every new question. A failed turn leaves the user's message in the log
//! without an answer; nothing is rolled back.

use tracing::debug;

use crate::chat::{Answerer, ChatRequest};
use crate::document::DocumentPayload;
use crate::error::{Error, Result};
use crate::message::{Conversation, Message};
use crate::prompt::{HistoryEntry, Turn};

pub struct ChatSession<A> {
    answerer: A,
    document: DocumentPayload,
    page_count: Option<u32>,
    conversation: Conversation,
}

impl<A: Answerer> ChatSession<A> {
    pub fn new(answerer: A, document: DocumentPayload) -> Self {
        Self {
            answerer,
            document,
            page_count: None,
            conversation: Conversation::new(),
        }
    }

    /// Report the document's page count so citations past the end are dropped.
    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = Some(page_count);
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Ask one question and return the assistant's reply message.
    ///
    /// The question is sent and logged exactly as typed; surrounding
    /// whitespace only matters for the emptiness check.
    pub async fn ask(&mut self, question: &str) -> Result<&Message> {
        if question.trim().is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".into()));
        }

        let history: Vec<HistoryEntry> = self
            .conversation
            .messages()
            .iter()
            .map(|m| HistoryEntry {
                role: m.role().to_string(),
                content: m.content().to_string(),
            })
            .collect();

        self.conversation.push(Message::user(question));
        debug!(
            conversation = %self.conversation.id,
            turns = self.conversation.len(),
            "Asking question"
        );

        let reply = self
            .answerer
            .answer(ChatRequest {
                question: question.to_string(),
                document: self.document.clone(),
                conversation_history: history,
                page_count: self.page_count,
            })
            .await?;

        self.conversation
            .push(Message::assistant(reply.answer, reply.citations));
        self.conversation
            .last()
            .ok_or_else(|| Error::Internal("conversation lost its last message".into()))
    }
}

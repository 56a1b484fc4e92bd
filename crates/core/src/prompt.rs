//! Prompt assembly.
//!
//! Every request to the model is `[system instruction] + prior turns + the new
//! question`. Prior turns are copied role-and-content only; citations and
//! other metadata never reach the model.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// Instruction sent as the first prompt message unless overridden in config.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are an intelligent document assistant. \
The user has uploaded a PDF document and wants to ask questions about it.

Your task is to:
1. Answer questions accurately based on the document content
2. Provide specific page references when mentioning information
3. Format your citations as [Page X] in your response
4. Be concise but thorough

When providing citations, mention the page number naturally in your answer like: \
\"According to the document [Page 3], the main findings show...\"";

/// One element of the prompt sent upstream.
///
/// The role is kept as a string: history supplied by a client is forwarded
/// verbatim and the upstream API is the one that rejects unknown roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System.as_str(), content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User.as_str(), content)
    }
}

/// A prior conversation turn as received on the wire.
///
/// Clients usually send back their whole message log, including the
/// `citations` of assistant turns; anything besides role and content is
/// accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

/// Anything that can stand in for a prior turn.
pub trait Turn {
    fn role(&self) -> &str;
    fn content(&self) -> &str;
}

impl Turn for Message {
    fn role(&self) -> &str {
        self.role.as_str()
    }

    fn content(&self) -> &str {
        &self.content
    }
}

impl Turn for HistoryEntry {
    fn role(&self) -> &str {
        &self.role
    }

    fn content(&self) -> &str {
        &self.content
    }
}

impl Turn for PromptMessage {
    fn role(&self) -> &str {
        &self.role
    }

    fn content(&self) -> &str {
        &self.content
    }
}

/// Build the prompt for one question.
///
/// Order is fixed: the system instruction first, then `history` in its
/// original order, then `question` as a user turn.
pub fn assemble<T: Turn>(
    system_instruction: &str,
    history: &[T],
    question: &str,
) -> Vec<PromptMessage> {
    let mut prompt = Vec::with_capacity(history.len() + 2);
    prompt.push(PromptMessage::system(system_instruction));
    prompt.extend(
        history
            .iter()
            .map(|turn| PromptMessage::new(turn.role(), turn.content())),
    );
    prompt.push(PromptMessage::user(question));
    prompt
}

//! # docchat Core
//!
//! Domain types, traits, and error definitions for docchat, a question
//! answering service over uploaded PDF documents.
//! This crate has **zero framework dependencies**: HTTP, configuration and
//! the upstream client live in their own crates and depend inward on this one.
//!
//! ## Pipeline
//!
//! 1. [`prompt::assemble`] builds the prompt from a system instruction, prior
//!    turns and the new question.
//! 2. A [`Provider`] sends it to the upstream chat-completion API.
//! 3. [`CitationSet::extract`] pulls the `[Page N]` markers out of the answer.
//!
//! [`ChatSession`] drives that pipeline turn by turn on the client side.

pub mod chat;
pub mod citation;
pub mod document;
pub mod error;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use chat::{Answerer, ChatReply, ChatRequest};
pub use citation::CitationSet;
pub use document::DocumentPayload;
pub use error::{Error, ProviderError, Result};
pub use message::{Conversation, ConversationId, Message, Role};
pub use prompt::{DEFAULT_SYSTEM_INSTRUCTION, HistoryEntry, PromptMessage, Turn};
pub use provider::{CompletionRequest, CompletionResponse, Provider, Usage};
pub use session::ChatSession;

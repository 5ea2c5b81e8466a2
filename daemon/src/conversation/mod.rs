//! Conversation with the hosted language model.
//!
//! `Conversation` owns the system instruction and the running history; the
//! model behind it is only asked to complete a full message list. Errors are
//! returned as-is so the caller decides what the user hears instead.

pub mod gigachat;

pub use gigachat::GigaChatClient;

use crate::error::ChatError;
use shared::Turn;
use std::sync::Arc;

/// A chat-completion backend.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[Turn]) -> Result<String, ChatError>;
}

pub struct Conversation {
    system_prompt: String,
    history: Vec<Turn>,
    model: Arc<dyn ChatModel>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            model,
        }
    }

    /// Turns exchanged so far, oldest first. The system instruction is not
    /// part of the history.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Sends `text` with the full history and records the exchange once the
    /// model has answered. A failed call leaves the history untouched.
    pub async fn respond(&mut self, text: &str) -> Result<String, ChatError> {
        let user = Turn::user(text);

        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Turn::system(self.system_prompt.clone()));
        messages.extend(self.history.iter().cloned());
        messages.push(user.clone());

        let reply = self.model.complete(&messages).await?;

        self.history.push(user);
        self.history.push(Turn::assistant(reply.clone()));
        tracing::debug!("Conversation history now holds {} turns", self.history.len());
        Ok(reply)
    }
}

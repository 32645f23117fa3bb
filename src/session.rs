//! Conversation history for the console chat.
//!
//! A [`ChatSession`] holds the user/assistant exchanges of one process run,
//! in turn order, plus an optional system prompt kept apart from them. It is
//! an ordinary owned value: the chat loop passes it around explicitly.
//!
//! # Example
//!
//! ```rust
//! use catalog_chat::session::ChatSession;
//!
//! let mut session = ChatSession::new();
//! session.add_user_message("Hello!");
//! session.add_assistant_message("Hi, how can I help?");
//!
//! assert_eq!(session.message_count(), 2);
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::llm::{Message, MessageRole};

/// A single conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    /// Unique session identifier.
    id: String,
    /// Conversation messages.
    messages: Vec<Message>,
    /// Optional system prompt.
    system_prompt: Option<String>,
    /// Session creation time.
    created_at: DateTime<Utc>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Create an empty session with a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            system_prompt: None,
            created_at: Utc::now(),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the system prompt for this session.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    /// Add a user message to the conversation.
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(MessageRole::User, content));
    }

    /// Add an assistant message to the conversation.
    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.messages
            .push(Message::new(MessageRole::Assistant, content));
    }

    /// Get all messages in the conversation.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get all messages preceded by the system prompt, ready to send.
    #[must_use]
    pub fn messages_with_system(&self) -> Vec<Message> {
        let mut result = Vec::with_capacity(self.messages.len() + 1);

        if let Some(prompt) = &self.system_prompt {
            result.push(Message::new(MessageRole::System, prompt.clone()));
        }

        result.extend(self.messages.iter().cloned());
        result
    }

    /// Get the number of messages in the conversation.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Clear all messages, keeping the system prompt.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Get the session age.
    #[must_use]
    pub fn age(&self) -> Duration {
        (Utc::now() - self.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }
}

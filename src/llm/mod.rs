//! LLM driver traits and implementations.
//!
//! Both supported backends speak the `OpenAI` Chat Completions wire format:
//! Ollama through its `/v1` compatibility layer and Azure `OpenAI` natively.
//! [`Provider`] captures the differences (URL layout, authentication), the
//! [`ChatCompletionsDriver`] streams one model response, and the
//! [`Orchestrator`] runs the automatic tool-calling loop on top of it.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use catalog_chat::llm::{LlmSettings, Orchestrator, Provider};
//! use catalog_chat::tools::ToolRegistry;
//!
//! let settings = LlmSettings {
//!     base_url: "http://localhost:11434".to_string(),
//!     api_key: None,
//!     model: "llama3.2".to_string(),
//!     provider: Provider::Ollama,
//!     parallel_tool_calls: None,
//! };
//! let orchestrator = Orchestrator::new(settings, Arc::new(ToolRegistry::new()));
//! ```

pub mod chat_completions;
pub mod event;
pub mod orchestrator;
pub mod provider;

pub use chat_completions::ChatCompletionsDriver;
pub use event::ChatEvent;
pub use orchestrator::Orchestrator;
pub use provider::Provider;

use futures::Stream;

/// LLM connection and model settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Endpoint of the model server (e.g., `http://localhost:11434`).
    pub base_url: String,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Model identifier (Azure: the deployment name).
    pub model: String,
    /// Provider type.
    pub provider: Provider,
    /// Whether to enable parallel tool calls (provider-dependent).
    pub parallel_tool_calls: Option<bool>,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("parallel_tool_calls", &self.parallel_tool_calls)
            .finish()
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content of the message.
    pub content: String,
    /// Optional tool call ID (for tool responses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Optional tool calls made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    /// Create a plain text message.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// Assistant turn that asks for tool calls.
    #[must_use]
    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::new(MessageRole::Assistant, content)
        }
    }

    /// Result of one tool call, answering `tool_call_id`.
    #[must_use]
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(MessageRole::Tool, content)
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
    /// Tool response.
    Tool,
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call.
    pub id: String,
    /// Type of tool (always "function" for now).
    #[serde(rename = "type")]
    pub call_type: String,
    /// Function details.
    pub function: ToolCallFunction,
}

/// Function details in a tool call.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolCallFunction {
    /// Function name.
    pub name: String,
    /// Arguments as JSON string.
    pub arguments: String,
}

/// Request to an LLM driver.
#[derive(Debug)]
pub struct LlmRequest {
    /// Conversation messages, tool traffic of the current turn included.
    pub messages: Vec<Message>,
    /// Available tools in `OpenAI` function schema format.
    pub tools: Vec<serde_json::Value>,
}

/// Boxed stream of events returned by a driver.
pub type EventStream = std::pin::Pin<Box<dyn Stream<Item = anyhow::Result<ChatEvent>> + Send>>;

/// Trait for LLM streaming drivers.
///
/// Implementations of this trait provide streaming access to LLM responses,
/// emitting [`ChatEvent`]s as the model generates output. A stream that
/// ends without the provider's end marker must yield an error.
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync {
    /// Stream a response from the LLM.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the connection is interrupted.
    async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_openai_shape() {
        let msg = Message::new(MessageRole::User, "How many products?");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "role": "user", "content": "How many products?" })
        );
    }

    #[test]
    fn test_tool_messages_serialize() {
        let call = ToolCall {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: ToolCallFunction {
                name: "catalog__count_products".to_string(),
                arguments: "{}".to_string(),
            },
        };
        let assistant = serde_json::to_value(Message::assistant_tool_calls("", vec![call])).unwrap();
        assert_eq!(assistant["role"], "assistant");
        assert_eq!(assistant["tool_calls"][0]["type"], "function");
        assert!(assistant.get("tool_call_id").is_none());

        let result = serde_json::to_value(Message::tool_result("call_1", r#"{"count":3}"#)).unwrap();
        assert_eq!(result["role"], "tool");
        assert_eq!(result["tool_call_id"], "call_1");
        assert!(result.get("tool_calls").is_none());
    }

    #[test]
    fn test_settings_debug_hides_key() {
        let settings = LlmSettings {
            base_url: "https://example.openai.azure.com".to_string(),
            api_key: Some("super-secret".to_string()),
            model: "gpt-4o".to_string(),
            provider: Provider::Ollama,
            parallel_tool_calls: None,
        };
        let printed = format!("{settings:?}");
        assert!(!printed.contains("super-secret"));
    }
}

//! The tool-calling loop.
//!
//! One chat turn may take several model round trips:
//! 1. Send the conversation to the model
//! 2. Stream its text, collecting any tool calls it requests
//! 3. Run those calls through the [`ToolRegistry`]
//! 4. Append the calls and their results, then ask again
//! 5. Stop once a response carries no tool calls
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use catalog_chat::llm::{Message, MessageRole, Orchestrator};
//!
//! let orchestrator = Orchestrator::new(settings, Arc::new(registry));
//! let answer = orchestrator
//!     .complete(vec![Message::new(MessageRole::User, "How many products are there?")])
//!     .await?;
//! ```

use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde_json::Value;
use uuid::Uuid;

use crate::tools::ToolRegistry;

use super::{
    ChatCompletionsDriver, ChatEvent, LlmDriver, LlmRequest, LlmSettings, Message, ToolCall,
    ToolCallFunction,
};

/// Default number of model round trips before a turn is abandoned.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

/// Runs chat turns, executing the tools the model asks for.
#[derive(Clone)]
pub struct Orchestrator {
    tools: Arc<ToolRegistry>,
    driver: Arc<dyn LlmDriver>,
    max_tool_iterations: usize,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("tools", &self.tools)
            .field("max_tool_iterations", &self.max_tool_iterations)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator talking Chat Completions to the configured provider.
    pub fn new(settings: LlmSettings, tools: Arc<ToolRegistry>) -> Self {
        Self::with_driver(Arc::new(ChatCompletionsDriver::new(settings)), tools)
    }

    /// Create an orchestrator over an arbitrary driver.
    pub fn with_driver(driver: Arc<dyn LlmDriver>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            tools,
            driver,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    /// Override the round-trip limit (at least one is always allowed).
    #[must_use]
    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max.max(1);
        self
    }

    /// Run one chat turn over the given message history.
    ///
    /// The stream carries `MessageDelta` for assistant text, `ToolResult`
    /// after each tool execution, and ends with `Done` or `Error`.
    pub fn chat_with_history(
        &self,
        messages: Vec<Message>,
    ) -> impl Stream<Item = ChatEvent> + Send + 'static {
        let request_id = Uuid::new_v4().to_string();
        let tools = self.tools.openai_tools_json();

        tracing::info!(
            request_id = %request_id,
            message_count = messages.len(),
            tool_count = tools.len(),
            "Starting chat turn"
        );

        let orchestrator = self.clone();
        let mut messages = messages;

        async_stream::stream! {
            for iteration in 1..=orchestrator.max_tool_iterations {
                tracing::debug!(
                    request_id = %request_id,
                    iteration,
                    message_count = messages.len(),
                    "Calling model"
                );

                let req = LlmRequest {
                    messages: messages.clone(),
                    tools: tools.clone(),
                };

                let response = match orchestrator.driver.stream(req).await {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::error!(request_id = %request_id, iteration, error = %e, "Model request failed");
                        yield ChatEvent::Error { message: e.to_string(), code: None };
                        return;
                    }
                };
                futures::pin_mut!(response);

                let mut text = String::new();
                let mut calls: Vec<ToolCall> = Vec::new();

                while let Some(event) = response.next().await {
                    match event {
                        Ok(ChatEvent::MessageDelta { text: delta }) => {
                            text.push_str(&delta);
                            yield ChatEvent::MessageDelta { text: delta };
                        }
                        Ok(ChatEvent::ToolCall { id, name, arguments }) => {
                            calls.push(ToolCall {
                                id,
                                call_type: "function".to_string(),
                                function: ToolCallFunction { name, arguments },
                            });
                        }
                        Ok(error @ ChatEvent::Error { .. }) => {
                            yield error;
                            return;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(request_id = %request_id, iteration, error = %e, "Model stream failed");
                            yield ChatEvent::Error { message: e.to_string(), code: None };
                            return;
                        }
                    }
                }

                if calls.is_empty() {
                    yield ChatEvent::Done;
                    return;
                }

                messages.push(Message::assistant_tool_calls(text, calls.clone()));

                for call in calls {
                    let (content, success) = orchestrator.run_tool(&request_id, &call).await;
                    yield ChatEvent::ToolResult {
                        id: call.id.clone(),
                        name: call.function.name.clone(),
                        content: content.clone(),
                        success,
                    };
                    messages.push(Message::tool_result(call.id, content));
                }
            }

            tracing::error!(
                request_id = %request_id,
                max_iterations = orchestrator.max_tool_iterations,
                "Maximum tool loop iterations exceeded"
            );
            yield ChatEvent::Error {
                message: "Maximum tool loop iterations exceeded".to_string(),
                code: Some("MAX_ITERATIONS".to_string()),
            };
        }
    }

    /// Execute one requested call. Failures become `Error: ...` text for the
    /// model rather than ending the turn.
    async fn run_tool(&self, request_id: &str, call: &ToolCall) -> (String, bool) {
        let name = &call.function.name;
        tracing::info!(request_id, tool_id = %call.id, tool_name = %name, "Executing tool call");

        let result = match parse_arguments(&call.function.arguments) {
            Ok(args) => self.tools.call_tool(name, args).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(value) => {
                let content = value.to_string();
                tracing::debug!(request_id, tool_id = %call.id, result = %content, "Tool call result");
                (content, true)
            }
            Err(e) => {
                tracing::error!(
                    request_id,
                    tool_id = %call.id,
                    tool_name = %name,
                    error = %e,
                    "Tool call failed"
                );
                (format!("Error: {e:#}"), false)
            }
        }
    }

    /// Run one chat turn and collect the final assistant text.
    ///
    /// Text produced before a tool phase is discarded; only the answer of the
    /// last model response is returned. An `Error` event becomes `Err`.
    pub async fn complete(&self, messages: Vec<Message>) -> anyhow::Result<String> {
        let stream = self.chat_with_history(messages);
        futures::pin_mut!(stream);

        let mut content = String::new();
        while let Some(event) = stream.next().await {
            match event {
                ChatEvent::MessageDelta { text } => content.push_str(&text),
                ChatEvent::ToolResult { .. } => content.clear(),
                ChatEvent::Error { message, .. } => anyhow::bail!(message),
                _ => {}
            }
        }

        Ok(content)
    }
}

/// Arguments of a tool call. An empty string means no arguments.
fn parse_arguments(raw: &str) -> anyhow::Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("invalid arguments: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{EventStream, MessageRole};
    use crate::tools::Tool;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays canned responses, one per driver call.
    struct ScriptedDriver {
        responses: Vec<Vec<ChatEvent>>,
        calls: AtomicUsize,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedDriver {
        fn new(responses: Vec<Vec<ChatEvent>>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmDriver for ScriptedDriver {
        async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream> {
            self.requests.lock().unwrap().push(req);
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let events = self
                .responses
                .get(n.min(self.responses.len() - 1))
                .cloned()
                .unwrap_or_default();
            Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
        }
    }

    #[derive(Debug)]
    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo arguments"
        }
        fn schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn call(&self, args: serde_json::Value) -> anyhow::Result<serde_json::Value> {
            Ok(args)
        }
    }

    fn tool_call_response(name: &str, args: &str) -> Vec<ChatEvent> {
        vec![
            ChatEvent::ToolCall {
                id: "call_1".to_string(),
                name: name.to_string(),
                arguments: args.to_string(),
            },
            ChatEvent::Done,
        ]
    }

    fn text_response(text: &str) -> Vec<ChatEvent> {
        vec![
            ChatEvent::MessageDelta {
                text: text.to_string(),
            },
            ChatEvent::Done,
        ]
    }

    fn user(text: &str) -> Vec<Message> {
        vec![Message::new(MessageRole::User, text)]
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let driver = Arc::new(ScriptedDriver::new(vec![text_response("Hello!")]));
        let orchestrator = Orchestrator::with_driver(driver, Arc::new(ToolRegistry::new()));

        let answer = orchestrator.complete(user("hi")).await.unwrap();
        assert_eq!(answer, "Hello!");
    }

    #[tokio::test]
    async fn test_tool_result_is_fed_back() {
        let driver = Arc::new(ScriptedDriver::new(vec![
            tool_call_response("echo", r#"{"x":1}"#),
            text_response("x is 1"),
        ]));
        let registry = ToolRegistry::new().with_tool(Arc::new(EchoTool));
        let orchestrator =
            Orchestrator::with_driver(Arc::clone(&driver) as Arc<dyn LlmDriver>, Arc::new(registry));

        let events: Vec<_> = orchestrator.chat_with_history(user("x?")).collect().await;
        assert!(events.iter().any(|e| matches!(
            e,
            ChatEvent::ToolResult { success: true, content, .. } if content == r#"{"x":1}"#
        )));
        assert_eq!(events.last(), Some(&ChatEvent::Done));

        let requests = driver.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let second = &requests[1].messages;
        assert_eq!(second.len(), 3);
        assert_eq!(second[1].role, MessageRole::Assistant);
        assert_eq!(second[1].tool_calls.as_ref().unwrap()[0].function.name, "echo");
        assert_eq!(second[2].role, MessageRole::Tool);
        assert_eq!(second[2].tool_call_id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_model() {
        let driver = Arc::new(ScriptedDriver::new(vec![
            tool_call_response("nope", "{}"),
            text_response("sorry"),
        ]));
        let orchestrator = Orchestrator::with_driver(driver, Arc::new(ToolRegistry::new()));

        let events: Vec<_> = orchestrator.chat_with_history(user("?")).collect().await;
        assert!(events.iter().any(|e| matches!(
            e,
            ChatEvent::ToolResult { success: false, content, .. } if content.starts_with("Error:")
        )));
        assert_eq!(orchestrator.complete(user("?")).await.unwrap(), "sorry");
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_not_run() {
        let driver = Arc::new(ScriptedDriver::new(vec![
            tool_call_response("echo", r#"{"limit": 1"#),
            text_response("retrying"),
        ]));
        let registry = ToolRegistry::new().with_tool(Arc::new(EchoTool));
        let orchestrator =
            Orchestrator::with_driver(Arc::clone(&driver) as Arc<dyn LlmDriver>, Arc::new(registry));

        let events: Vec<_> = orchestrator.chat_with_history(user("list")).collect().await;
        let results: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::ToolResult { content, success, .. } => Some((content.clone(), *success)),
                _ => None,
            })
            .collect();
        assert_eq!(results.len(), 1);
        assert!(!results[0].1);
        assert!(results[0].0.starts_with("Error: invalid arguments"), "{}", results[0].0);

        // the model sees the failure, not an echo of `{}`
        let requests = driver.requests.lock().unwrap();
        assert_eq!(requests[1].messages[2].content, results[0].0);
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments("  ").unwrap(), serde_json::json!({}));
        assert_eq!(parse_arguments(r#"{"a":1}"#).unwrap(), serde_json::json!({"a": 1}));
        assert!(parse_arguments("{").is_err());
    }

    #[tokio::test]
    async fn test_driver_error_event_ends_turn() {
        let driver = Arc::new(ScriptedDriver::new(vec![vec![
            ChatEvent::MessageDelta {
                text: "partial".to_string(),
            },
            ChatEvent::Error {
                message: "stream cut".to_string(),
                code: None,
            },
        ]]));
        let orchestrator = Orchestrator::with_driver(driver, Arc::new(ToolRegistry::new()));

        let err = orchestrator.complete(user("hi")).await.unwrap_err();
        assert_eq!(err.to_string(), "stream cut");
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let driver = Arc::new(ScriptedDriver::new(vec![tool_call_response("echo", "{}")]));
        let registry = ToolRegistry::new().with_tool(Arc::new(EchoTool));
        let orchestrator = Orchestrator::with_driver(driver, Arc::new(registry))
            .with_max_tool_iterations(3);

        let err = orchestrator.complete(user("loop")).await.unwrap_err();
        assert!(err.to_string().contains("Maximum tool loop iterations"));
    }
}

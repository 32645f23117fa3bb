//! `OpenAI` Chat Completions API driver.
//!
//! This module implements the [`LlmDriver`] trait for the Chat Completions
//! wire format, supporting streaming responses and tool calls. Both Ollama
//! (`/v1/chat/completions`) and Azure `OpenAI` deployments are served by it.
//!
//! SSE framing (LF or CRLF line endings, multi-line `data:` fields) is left
//! to `eventsource-stream`; this module only interprets the JSON chunks.

use std::collections::BTreeMap;

use anyhow::anyhow;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde_json::Value;
use tracing::Instrument;

use super::{ChatEvent, EventStream, LlmDriver, LlmRequest, LlmSettings};

/// End-of-stream marker sent as the last `data:` payload.
const DONE_MARKER: &str = "[DONE]";

/// Driver for the Chat Completions API.
///
/// Posts to the provider's chat completions URL and streams the response as
/// [`ChatEvent`]s.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    fn request_body(&self, req: LlmRequest) -> Value {
        let mut body = serde_json::json!({
            "model": self.settings.model,
            "stream": true,
            "messages": req.messages,
        });

        if !req.tools.is_empty() {
            body["tools"] = Value::Array(req.tools);
            // Let the model decide when to call the catalog functions.
            body["tool_choice"] = Value::from("auto");
            if let Some(parallel) = self.settings.parallel_tool_calls {
                body["parallel_tool_calls"] = Value::Bool(parallel);
            }
        }

        body
    }
}

#[async_trait::async_trait]
impl LlmDriver for ChatCompletionsDriver {
    async fn stream(&self, req: LlmRequest) -> anyhow::Result<EventStream> {
        let provider = &self.settings.provider;
        let url = provider.build_chat_url(&self.settings.base_url);
        let body = self.request_body(req);

        let span = tracing::info_span!(
            "http.client.request",
            http.request.method = "POST",
            url.full = %url,
            gen_ai.system = provider.system_name(),
            gen_ai.request.model = %self.settings.model,
            http.response.status_code = tracing::field::Empty,
        );

        let rb = provider.authorize(
            self.http.post(&url).json(&body),
            self.settings.api_key.as_deref(),
        );

        let resp = async {
            let resp = rb.send().await?;
            tracing::Span::current().record("http.response.status_code", resp.status().as_u16());
            resp.error_for_status()
        }
        .instrument(span)
        .await?;

        let events = resp.bytes_stream().eventsource();

        let out = async_stream::try_stream! {
            let mut decoder = ChunkDecoder::default();
            let mut finished = false;

            futures::pin_mut!(events);
            while let Some(event) = events.next().await {
                let event = event?;
                let data = event.data.trim();
                if data.is_empty() {
                    continue;
                }
                if data == DONE_MARKER {
                    finished = true;
                    break;
                }

                let chunk: Value = serde_json::from_str(data)?;
                for ev in decoder.decode(&chunk) {
                    yield ev;
                }
            }

            if !finished {
                Err::<(), _>(anyhow!("model stream ended before {DONE_MARKER}"))?;
            }

            for ev in decoder.finish() {
                yield ev;
            }
            yield ChatEvent::Done;
        };

        Ok(Box::pin(out))
    }
}

/// Tool call being assembled from streamed deltas.
#[derive(Debug, Default)]
struct PendingCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Turns Chat Completions chunks into [`ChatEvent`]s.
///
/// Tool calls arrive split across chunks, keyed by `index`; they are released
/// as whole [`ChatEvent::ToolCall`]s once a finish reason arrives, or when the
/// stream ends.
#[derive(Debug, Default)]
struct ChunkDecoder {
    pending: BTreeMap<usize, PendingCall>,
}

impl ChunkDecoder {
    fn decode(&mut self, chunk: &Value) -> Vec<ChatEvent> {
        let mut out = Vec::new();

        // Azure sends a prompt-filter chunk with no choices first
        let Some(choice) = chunk["choices"].get(0) else {
            return out;
        };
        let delta = &choice["delta"];

        if let Some(text) = delta["content"].as_str().filter(|t| !t.is_empty()) {
            out.push(ChatEvent::MessageDelta {
                text: text.to_string(),
            });
        }

        for tc in delta["tool_calls"].as_array().into_iter().flatten() {
            let index = tc["index"].as_u64().unwrap_or(0) as usize;
            let call = self.pending.entry(index).or_default();
            if call.id.is_none() {
                call.id = tc["id"].as_str().map(ToString::to_string);
            }
            if call.name.is_none() {
                call.name = tc["function"]["name"].as_str().map(ToString::to_string);
            }
            if let Some(args) = tc["function"]["arguments"].as_str() {
                call.arguments.push_str(args);
            }
        }

        // Ollama may report "stop" even when it produced tool calls
        if choice["finish_reason"].is_string() {
            out.extend(self.finish());
        }

        out
    }

    fn finish(&mut self) -> Vec<ChatEvent> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter_map(|(index, call)| match (call.id, call.name) {
                (Some(id), Some(name)) => Some(ChatEvent::ToolCall {
                    id,
                    name,
                    arguments: call.arguments,
                }),
                (id, name) => {
                    tracing::warn!(index, ?id, ?name, "Dropping tool call without id or name");
                    None
                }
            })
            .collect()
    }
}

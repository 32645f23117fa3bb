//! Events flowing out of a chat turn.
//!
//! The driver produces [`ChatEvent::MessageDelta`], [`ChatEvent::ToolCall`]
//! and [`ChatEvent::Done`] from one model response. The orchestrator consumes
//! the tool calls itself and hands the console text deltas, tool results and
//! a final `Done` or `Error`.

/// One step of a streamed chat turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A fragment of assistant text.
    MessageDelta { text: String },

    /// A fully assembled function call requested by the model.
    ToolCall {
        id: String,
        name: String,
        /// Raw JSON arguments, exactly as the model produced them.
        arguments: String,
    },

    /// Outcome of running a requested tool. `content` is the JSON result, or
    /// `Error: ...` text when `success` is false.
    ToolResult {
        id: String,
        name: String,
        content: String,
        success: bool,
    },

    /// The turn failed.
    Error {
        message: String,
        /// Machine-readable reason, e.g. `MAX_ITERATIONS`.
        code: Option<String>,
    },

    /// The response is complete.
    Done,
}

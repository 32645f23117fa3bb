//! Interactive question/answer loop.

use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use crate::console::read_line;
use crate::error::AppError;
use crate::llm::{ChatEvent, Orchestrator};
use crate::session::ChatSession;

/// Everything one chat loop needs, passed explicitly instead of living in
/// process-wide state.
#[derive(Debug)]
pub struct ChatContext {
    pub orchestrator: Orchestrator,
    pub session: ChatSession,
}

impl ChatContext {
    pub fn new(orchestrator: Orchestrator, session: ChatSession) -> Self {
        Self {
            orchestrator,
            session,
        }
    }
}

/// Run the chat loop until `input` reaches EOF.
///
/// Returns the number of answered questions. A failed model call ends the
/// loop with that error; the question stays in the history unanswered.
pub async fn run_chat_loop<R, W>(
    ctx: &mut ChatContext,
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut turns = 0;

    loop {
        output.write_all(b"Your question:\n").await?;
        output.flush().await?;

        let question = match read_line(input, "the question").await {
            Ok(line) => line,
            Err(AppError::InputClosed(_)) => break,
            Err(e) => return Err(e.into()),
        };
        if question.trim().is_empty() {
            continue;
        }

        let span = tracing::info_span!(
            "chat.question",
            session.id = %ctx.session.id(),
            turn = turns + 1,
        );
        ask(ctx, question, output).instrument(span).await?;
        turns += 1;
    }

    tracing::info!(
        session_id = %ctx.session.id(),
        turns,
        elapsed_secs = ctx.session.age().as_secs(),
        "Chat session ended"
    );
    Ok(turns)
}

/// One exchange: record the question, stream the answer, record the answer.
async fn ask<W>(ctx: &mut ChatContext, question: String, output: &mut W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    ctx.session.add_user_message(question);

    output.write_all(b"\nAI answer:\n\n").await?;
    output.flush().await?;

    let stream = ctx
        .orchestrator
        .chat_with_history(ctx.session.messages_with_system());
    futures::pin_mut!(stream);

    let mut answer = String::new();
    while let Some(event) = stream.next().await {
        match event {
            ChatEvent::MessageDelta { text } => {
                output.write_all(text.as_bytes()).await?;
                output.flush().await?;
                answer.push_str(&text);
            }
            ChatEvent::ToolResult {
                name, success, ..
            } => {
                tracing::debug!(tool = %name, success, "Tool executed");
                // Text streamed before a tool phase is preamble, not the answer.
                if !answer.is_empty() {
                    output.write_all(b"\n").await?;
                }
                answer.clear();
            }
            ChatEvent::Error { message, code } => {
                tracing::error!(error = %message, code = ?code, "Chat turn failed");
                anyhow::bail!(message);
            }
            _ => {}
        }
    }

    output.write_all(b"\n\n\n").await?;
    output.flush().await?;

    ctx.session.add_assistant_message(answer);
    Ok(())
}

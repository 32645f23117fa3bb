//! Startup prompts: which AI solution to talk to and how many fake products
//! to generate.

use std::fmt;
use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::AppError;

/// The chat-completion backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiBackend {
    /// Local Ollama server.
    Ollama,
    /// Azure `OpenAI` deployment.
    AzureOpenAi,
}

impl FromStr for AiBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "ollama" => Ok(Self::Ollama),
            "2" | "azure" | "azure-openai" | "azureopenai" => Ok(Self::AzureOpenAi),
            _ => Err(AppError::InvalidBackend(s.to_string())),
        }
    }
}

impl fmt::Display for AiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ollama => write!(f, "Ollama"),
            Self::AzureOpenAi => write!(f, "Azure OpenAI"),
        }
    }
}

/// Ask which AI solution to use.
///
/// An unrecognized answer is fatal: [`AppError::InvalidBackend`].
pub async fn prompt_backend<R, W>(input: &mut R, output: &mut W) -> Result<AiBackend, AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(b"AI solution:\n  1 - Ollama (local)\n  2 - Azure OpenAI (cloud)\nYour choice: ")
        .await?;
    output.flush().await?;

    let line = read_line(input, "the AI solution").await?;
    line.parse()
}

/// Ask how many fake products to generate. Re-prompts until the answer is a
/// non-negative integer.
pub async fn prompt_record_count<R, W>(input: &mut R, output: &mut W) -> Result<usize, AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        output
            .write_all(b"Number of new products to generate: ")
            .await?;
        output.flush().await?;

        let line = read_line(input, "the number of products").await?;
        match line.trim().parse::<usize>() {
            Ok(n) => return Ok(n),
            Err(_) => {
                tracing::debug!(answer = %line.trim(), "Rejected product count");
                output
                    .write_all(b"Please type a whole number (0 or more).\n")
                    .await?;
            }
        }
    }
}

/// Read one line, without its terminator. EOF is reported as
/// [`AppError::InputClosed`].
pub async fn read_line<R>(input: &mut R, what: &'static str) -> Result<String, AppError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = input.read_line(&mut line).await?;
    if n == 0 {
        return Err(AppError::InputClosed(what));
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

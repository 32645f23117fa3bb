//! Provider-specific configuration.
//!
//! This module handles the differences between the two chat-completion
//! backends: URL layout and authentication.

/// Supported LLM providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// Local Ollama server, through its `OpenAI`-compatible API.
    Ollama,
    /// Azure `OpenAI` Service
    AzureOpenAI {
        /// Deployment name (required for Azure)
        deployment_name: String,
        /// API version (e.g., "2024-08-01-preview")
        api_version: String,
    },
}

impl Provider {
    /// Short identifier used as the `gen_ai.system` span attribute.
    #[must_use]
    pub fn system_name(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::AzureOpenAI { .. } => "az.ai.openai",
        }
    }

    /// Build the chat completions URL for this provider.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The endpoint (a trailing slash is tolerated)
    #[must_use]
    pub fn build_chat_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');

        match self {
            Self::AzureOpenAI {
                deployment_name,
                api_version,
            } => {
                format!(
                    "{base}/openai/deployments/{deployment_name}/chat/completions?api-version={api_version}"
                )
            }
            Self::Ollama => format!("{base}/v1/chat/completions"),
        }
    }

    /// Attach credentials to an outgoing request.
    ///
    /// Azure expects an `api-key` header; Ollama needs nothing, but a bearer
    /// token is forwarded when one is configured (reverse proxies).
    #[must_use]
    pub fn authorize(
        &self,
        rb: reqwest::RequestBuilder,
        api_key: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match (self, api_key) {
            (Self::AzureOpenAI { .. }, Some(key)) => rb.header("api-key", key),
            (Self::Ollama, Some(key)) => rb.bearer_auth(key),
            (_, None) => rb,
        }
    }
}

use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Model backend capability consumed by the workflow steps
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError>;

    /// Run a chat exchange, optionally asking for a JSON object response
    async fn chat(
        &self,
        messages: &[ChatMessage],
        format: ResponseFormat,
    ) -> Result<ChatResponse, LlmError>;

    /// Model identifier, used for logging and output layout
    fn model(&self) -> &str;
}

#[async_trait]
impl<B: LlmBackend + ?Sized> LlmBackend for Arc<B> {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        (**self).complete(prompt).await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        format: ResponseFormat,
    ) -> Result<ChatResponse, LlmError> {
        (**self).chat(messages, format).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

/// Errors raised by model backends
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
}

impl LlmError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Unavailable(_) | LlmError::Timeout(_))
    }
}

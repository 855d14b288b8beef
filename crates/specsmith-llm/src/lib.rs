//! Language model backends
//!
//! The workflow treats the model as an opaque capability: `complete` for a
//! single prompt, `chat` for a message list with an optional JSON response
//! mode. [`OpenAiClient`] talks to any OpenAI-compatible endpoint;
//! [`RetryingBackend`] adds bounded exponential backoff around any backend.

use serde::{Deserialize, Serialize};

pub use backend::*;
pub use client::*;
pub use retry::*;
pub use types::*;

mod backend;
mod client;
mod retry;
mod types;

/// Connection and sampling settings for one model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat completions endpoint
    pub endpoint: String,
    /// API key sent as a bearer token
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens for the response, provider default when unset
    pub max_tokens: Option<u32>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Ask for a JSON object response on every chat call
    pub json_mode: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            temperature: 1.0,
            max_tokens: None,
            timeout_secs: 300,
            json_mode: false,
        }
    }
}

impl LlmConfig {
    /// Settings for the structured-output model used to split code into files
    pub fn structured_output() -> Self {
        Self {
            json_mode: true,
            ..Self::default()
        }
    }
}

use crate::*;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP client for OpenAI-compatible chat completion endpoints
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiClient {
    /// Create a new client from configuration
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.endpoint.trim().is_empty() {
            return Err(LlmError::Misconfiguration("endpoint must not be empty".to_string()));
        }
        if config.model.trim().is_empty() {
            return Err(LlmError::Misconfiguration("model must not be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                LlmError::Misconfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn build_request_body(&self, messages: &[ChatMessage], format: ResponseFormat) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": messages,
        });

        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if format == ResponseFormat::JsonObject || self.config.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        body
    }

    async fn send(&self, body: &Value) -> Result<String, LlmError> {
        tracing::debug!(
            model = %self.config.model,
            endpoint = %self.config.endpoint,
            "Sending chat request"
        );

        let mut request = self.client.post(&self.config.endpoint).json(body);

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::map_status_error(status, error_text));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(Duration::from_secs(self.config.timeout_secs))
            } else {
                LlmError::InvalidResponse(format!("Response body is not JSON: {}", e))
            }
        })?;

        Self::extract_content_from_response(&response_json)
    }

    fn map_transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(Duration::from_secs(self.config.timeout_secs))
        } else {
            LlmError::Unavailable(format!("Request failed: {}", error))
        }
    }

    fn map_status_error(status: StatusCode, error_text: String) -> LlmError {
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            LlmError::Unavailable(format!("API error {}: {}", status, error_text))
        } else {
            LlmError::Api {
                status: status.as_u16(),
                message: error_text,
            }
        }
    }

    fn extract_content_from_response(response: &Value) -> Result<String, LlmError> {
        // Handle different API response formats
        if let Some(content) = response["choices"][0]["message"]["content"].as_str() {
            Ok(content.to_string())
        } else if let Some(content) = response["content"][0]["text"].as_str() {
            Ok(content.to_string())
        } else if let Some(content) = response["text"].as_str() {
            Ok(content.to_string())
        } else {
            Err(LlmError::InvalidResponse("Unable to extract content from response".to_string()))
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let body = self.build_request_body(&[ChatMessage::user(prompt)], ResponseFormat::Text);
        let text = self.send(&body).await?;
        Ok(Completion { text })
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        format: ResponseFormat,
    ) -> Result<ChatResponse, LlmError> {
        let body = self.build_request_body(messages, format);
        let content = self.send(&body).await?;
        Ok(ChatResponse {
            message: ChatMessage::assistant(content),
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Builder for [`OpenAiClient`] configuration
pub struct LlmClientBuilder {
    config: LlmConfig,
}

impl LlmClientBuilder {
    pub fn new() -> Self {
        Self {
            config: LlmConfig::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    pub fn json_mode(mut self, json_mode: bool) -> Self {
        self.config.json_mode = json_mode;
        self
    }

    pub fn build(self) -> Result<OpenAiClient, LlmError> {
        OpenAiClient::new(self.config)
    }
}

impl Default for LlmClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Bounded retry with exponential backoff around a model backend
//!
//! The workflow engine never retries on its own. Applications that want
//! resilience against flaky providers wrap their backend in a
//! [`RetryingBackend`] before handing it to the workflow.

use crate::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Policy for retrying failed backend calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial backoff duration
    #[serde(with = "duration_ms")]
    pub initial_backoff: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f32,
    /// Maximum backoff duration
    #[serde(with = "duration_ms")]
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Create a conservative retry policy
    pub fn conservative() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff: Duration::from_secs(2),
            backoff_multiplier: 3.0,
            max_backoff: Duration::from_secs(60),
        }
    }

    /// Create an aggressive retry policy
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            backoff_multiplier: 1.5,
            max_backoff: Duration::from_secs(15),
        }
    }

    /// Single attempt, never retry
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Calculate backoff duration for given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        // Negative or non-finite multipliers keep the backoff constant
        let multiplier = if self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 0.0 {
            f64::from(self.backoff_multiplier)
        } else {
            1.0
        };
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let backoff_secs = self.initial_backoff.as_secs_f64() * multiplier.powi(exponent);

        Duration::try_from_secs_f64(backoff_secs)
            .map_or(self.max_backoff, |backoff| backoff.min(self.max_backoff))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let backoff = self.calculate_backoff(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        "Backend call failed, retrying: {}",
                        error
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Backend wrapper that applies a [`RetryPolicy`] to every call
#[derive(Debug, Clone)]
pub struct RetryingBackend<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B: LlmBackend> RetryingBackend<B> {
    pub fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

#[async_trait]
impl<B: LlmBackend> LlmBackend for RetryingBackend<B> {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        self.policy.run(move || self.inner.complete(prompt)).await
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        format: ResponseFormat,
    ) -> Result<ChatResponse, LlmError> {
        self.policy.run(move || self.inner.chat(messages, format)).await
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that fails with queued errors before succeeding
    struct FlakyBackend {
        failures: Mutex<VecDeque<LlmError>>,
        calls: Mutex<u32>,
    }

    impl FlakyBackend {
        fn new(failures: Vec<LlmError>) -> Self {
            Self {
                failures: Mutex::new(failures.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmBackend for FlakyBackend {
        async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
            *self.calls.lock().unwrap() += 1;
            match self.failures.lock().unwrap().pop_front() {
                Some(error) => Err(error),
                None => Ok(Completion {
                    text: format!("echo: {}", prompt),
                }),
            }
        }

        async fn chat(
            &self,
            messages: &[ChatMessage],
            _format: ResponseFormat,
        ) -> Result<ChatResponse, LlmError> {
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
            let completion = self.complete(last).await?;
            Ok(ChatResponse {
                message: ChatMessage::assistant(completion.text),
            })
        }

        fn model(&self) -> &str {
            "flaky"
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_retry_policy_backoff_calculation() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.calculate_backoff(0), Duration::from_secs(0));
        assert_eq!(policy.calculate_backoff(1), Duration::from_secs(1));
        assert_eq!(policy.calculate_backoff(2), Duration::from_secs(2));
        assert_eq!(policy.calculate_backoff(3), Duration::from_secs(4));
        assert_eq!(policy.calculate_backoff(10), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_with_bad_multiplier_stays_bounded() {
        let negative = RetryPolicy {
            backoff_multiplier: -2.0,
            ..RetryPolicy::default()
        };
        assert_eq!(negative.calculate_backoff(2), Duration::from_secs(1));
        assert_eq!(negative.calculate_backoff(3), Duration::from_secs(1));

        let not_a_number = RetryPolicy {
            backoff_multiplier: f32::NAN,
            ..RetryPolicy::default()
        };
        assert_eq!(not_a_number.calculate_backoff(5), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_for_late_attempts_caps_at_max() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.calculate_backoff(200), Duration::from_secs(30));
        assert_eq!(policy.calculate_backoff(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_policy_presets() {
        assert_eq!(RetryPolicy::conservative().max_attempts, 2);
        assert_eq!(RetryPolicy::aggressive().max_attempts, 5);
        assert_eq!(RetryPolicy::none().max_attempts, 1);
        assert_eq!(RetryPolicy::aggressive().calculate_backoff(1), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let backend = RetryingBackend::new(
            FlakyBackend::new(vec![
                LlmError::Unavailable("connection reset".to_string()),
                LlmError::Timeout(Duration::from_secs(1)),
            ]),
            fast_policy(3),
        );

        let completion = tokio_test::assert_ok!(backend.complete("ping").await);
        assert_eq!(completion.text, "echo: ping");
        assert_eq!(backend.into_inner().calls(), 3);
    }

    #[tokio::test]
    async fn test_negative_multiplier_still_retries() {
        let policy = RetryPolicy {
            backoff_multiplier: -2.0,
            ..fast_policy(3)
        };
        let backend = RetryingBackend::new(
            FlakyBackend::new(vec![
                LlmError::Unavailable("overloaded".to_string()),
                LlmError::Unavailable("overloaded".to_string()),
            ]),
            policy,
        );

        let completion = tokio_test::assert_ok!(backend.complete("ping").await);
        assert_eq!(completion.text, "echo: ping");
        assert_eq!(backend.into_inner().calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let backend = RetryingBackend::new(
            FlakyBackend::new(vec![
                LlmError::Unavailable("down".to_string()),
                LlmError::Unavailable("still down".to_string()),
                LlmError::Unavailable("never mind".to_string()),
            ]),
            fast_policy(2),
        );

        let error = tokio_test::assert_err!(backend.complete("ping").await);
        assert_eq!(error, LlmError::Unavailable("still down".to_string()));
        assert_eq!(backend.into_inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_fast() {
        let backend = RetryingBackend::new(
            FlakyBackend::new(vec![LlmError::Api {
                status: 400,
                message: "bad request".to_string(),
            }]),
            fast_policy(5),
        );

        let error = backend
            .chat(&[ChatMessage::user("x")], ResponseFormat::Text)
            .await
            .unwrap_err();
        assert!(matches!(error, LlmError::Api { status: 400, .. }));
        assert_eq!(backend.into_inner().calls(), 1);
    }

    #[test]
    fn test_policy_serializes_durations_as_millis() {
        let json = serde_json::to_value(RetryPolicy::aggressive()).unwrap();
        assert_eq!(json["initial_backoff"], 500);
        assert_eq!(json["max_backoff"], 15_000);

        let parsed: RetryPolicy =
            serde_json::from_value(serde_json::json!({ "max_attempts": 4 })).unwrap();
        assert_eq!(parsed.max_attempts, 4);
        assert_eq!(parsed.initial_backoff, Duration::from_secs(1));
    }
}

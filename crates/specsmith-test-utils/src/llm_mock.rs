use async_trait::async_trait;
use specsmith_llm::*;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Which backend method a recorded call went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Complete,
    Chat,
}

/// One call made against a [`MockLlm`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    /// The prompt for `complete`, the joined message contents for `chat`
    pub prompt: String,
    pub messages: Vec<ChatMessage>,
    pub format: ResponseFormat,
}

type Reply = Result<String, LlmError>;

#[derive(Debug)]
struct PromptRule {
    needle: String,
    replies: VecDeque<Reply>,
}

impl PromptRule {
    /// Pop the next reply, repeating the last one once the script runs out
    fn next(&mut self) -> Option<Reply> {
        if self.replies.len() > 1 {
            self.replies.pop_front()
        } else {
            self.replies.front().cloned()
        }
    }
}

/// Scripted model backend.
///
/// Replies are chosen by the first rule whose needle occurs in the prompt.
/// Each rule answers with its replies in order and keeps repeating the last
/// one. Chat calls take scripted chat replies first, then fall back to the
/// prompt rules.
#[derive(Debug)]
pub struct MockLlm {
    model: String,
    rules: Mutex<Vec<PromptRule>>,
    chat_replies: Mutex<VecDeque<Reply>>,
    failure: Option<LlmError>,
    fallback: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            rules: Mutex::new(Vec::new()),
            chat_replies: Mutex::new(VecDeque::new()),
            failure: None,
            fallback: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Answer prompts containing `needle` with `replies`, in order
    pub fn on_prompt<I, R>(self, needle: impl Into<String>, replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let replies = replies.into_iter().map(|r| Ok(r.into())).collect();
        self.push_rule(needle.into(), replies)
    }

    /// Fail prompts containing `needle` with `error`
    pub fn on_prompt_fail(self, needle: impl Into<String>, error: LlmError) -> Self {
        self.push_rule(needle.into(), VecDeque::from(vec![Err(error)]))
    }

    /// Mix of replies and failures for prompts containing `needle`
    pub fn on_prompt_script(
        self,
        needle: impl Into<String>,
        script: impl IntoIterator<Item = Result<String, LlmError>>,
    ) -> Self {
        self.push_rule(needle.into(), script.into_iter().collect())
    }

    /// Queue a reply for the next chat call
    pub fn on_chat(self, reply: impl Into<String>) -> Self {
        lock(&self.chat_replies).push_back(Ok(reply.into()));
        self
    }

    /// Queue a failure for the next chat call
    pub fn on_chat_fail(self, error: LlmError) -> Self {
        lock(&self.chat_replies).push_back(Err(error));
        self
    }

    /// Make every call fail with `error`
    pub fn failing_with(mut self, error: LlmError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Reply used when no rule matches
    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push_rule(self, needle: String, replies: VecDeque<Reply>) -> Self {
        lock(&self.rules).push(PromptRule { needle, replies });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<RecordedCall> {
        lock(&self.calls).iter().filter(|c| c.kind == kind).cloned().collect()
    }

    /// Number of calls whose prompt contains `needle`
    pub fn prompts_containing(&self, needle: &str) -> usize {
        lock(&self.calls).iter().filter(|c| c.prompt.contains(needle)).count()
    }

    fn record(&self, call: RecordedCall) {
        lock(&self.calls).push(call);
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn reply_for(&self, prompt: &str) -> Reply {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let scripted = lock(&self.rules)
            .iter_mut()
            .find(|rule| prompt.contains(&rule.needle))
            .and_then(PromptRule::next);

        match scripted {
            Some(reply) => reply,
            None => self.fallback.clone().ok_or_else(|| {
                let preview: String = prompt.chars().take(80).collect();
                LlmError::InvalidResponse(format!("no scripted reply for prompt: {}", preview))
            }),
        }
    }

    fn chat_reply_for(&self, prompt: &str) -> Reply {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let queued = {
            let mut replies = lock(&self.chat_replies);
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            }
        };

        match queued {
            Some(reply) => reply,
            None => self.reply_for(prompt),
        }
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for MockLlm {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        self.record(RecordedCall {
            kind: CallKind::Complete,
            prompt: prompt.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            format: ResponseFormat::Text,
        });
        self.pause().await;

        let text = self.reply_for(prompt)?;
        tracing::trace!(reply_len = text.len(), "Mock completion");
        Ok(Completion { text })
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        format: ResponseFormat,
    ) -> Result<ChatResponse, LlmError> {
        let prompt = messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n");
        self.record(RecordedCall {
            kind: CallKind::Chat,
            prompt: prompt.clone(),
            messages: messages.to_vec(),
            format,
        });
        self.pause().await;

        let content = self.chat_reply_for(&prompt)?;
        Ok(ChatResponse {
            message: ChatMessage::assistant(content),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

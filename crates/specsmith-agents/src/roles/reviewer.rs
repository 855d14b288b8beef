use crate::{prompts, truncate, CodeAgentState, ACCEPTANCE_MARKER, MAX_REVIEWS};
use async_trait::async_trait;
use specsmith_core::*;

/// Accepts the code, asks for changes, or gives up after `max_reviews` rounds.
///
/// Giving up returns the latest code unpackaged, skipping the packager.
pub struct Reviewer {
    max_reviews: u32,
}

impl Reviewer {
    pub fn new(max_reviews: u32) -> Self {
        Self { max_reviews }
    }
}

impl Default for Reviewer {
    fn default() -> Self {
        Self::new(MAX_REVIEWS)
    }
}

#[async_trait]
impl Step<CodeAgentState, AgentOutput> for Reviewer {
    type Input = CodeEvent;

    fn name(&self) -> &str {
        "reviewer"
    }

    async fn handle(
        &self,
        ctx: &mut RunContext<CodeAgentState>,
        input: CodeEvent,
    ) -> Result<Event<AgentOutput>, WorkflowError> {
        let spec = ctx.state().specification()?.to_string();
        let reviews = ctx.state_mut().increment_reviews();

        if reviews > self.max_reviews {
            ctx.emit(format!("Already reviewed {} times, stopping!", reviews - 1));
            tracing::info!(
                reviews = reviews - 1,
                "Review limit reached, returning code unpackaged"
            );
            return Ok(Event::stop(AgentOutput::Unpackaged(input.code)));
        }

        ctx.emit(format!("Review #{}: {}", reviews, truncate(&input.code)));
        let review = ctx.llm().complete(&prompts::reviewer(&input.code, &spec)).await?.text;

        if review.contains(ACCEPTANCE_MARKER) {
            ctx.emit(format!("Reviewer says: {}", review));
            tracing::debug!(reviews, "Code accepted");
            return Ok(Event::package(input.code));
        }

        tracing::debug!(reviews, "Changes requested");
        Ok(Event::review(review, input.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::test_support::context_with_spec;
    use specsmith_test_utils::*;

    fn code(code: &str) -> CodeEvent {
        CodeEvent { code: code.to_string() }
    }

    #[tokio::test]
    async fn test_acceptance_leads_to_packaging() {
        let llm = MockLlm::new().on_prompt("Review this code", ["Looks great!"]);
        let (mut ctx, mut stream) = context_with_spec(llm, "spec");

        let event = Reviewer::default().handle(&mut ctx, code("print(1)")).await.unwrap();

        assert_eq!(event, Event::package("print(1)"));
        assert_eq!(ctx.state().review_count(), 1);
        assert_eq!(stream.recv().await.unwrap().msg, "Review #1: print(1)");
        assert_eq!(stream.recv().await.unwrap().msg, "Reviewer says: Looks great!");
    }

    #[tokio::test]
    async fn test_critique_requests_changes() {
        let llm = MockLlm::new().on_prompt("Review this code", ["Handle empty input"]);
        let (mut ctx, _stream) = context_with_spec(llm, "spec");

        let event = Reviewer::default().handle(&mut ctx, code("v1")).await.unwrap();
        assert_eq!(event, Event::review("Handle empty input", "v1"));
    }

    #[tokio::test]
    async fn test_acceptance_marker_is_case_sensitive() {
        let llm = MockLlm::new().on_prompt("Review this code", ["looks great"]);
        let (mut ctx, _stream) = context_with_spec(llm, "spec");

        let event = Reviewer::default().handle(&mut ctx, code("v1")).await.unwrap();
        assert_eq!(event.kind(), EventKind::Review);
    }

    #[tokio::test]
    async fn test_limit_stops_without_calling_model() {
        let llm = std::sync::Arc::new(MockLlm::new().on_prompt("Review this code", ["needs work"]));
        let (notifier, mut stream) = notification_channel();
        let mut ctx = RunContext::new(CodeAgentState::default(), llm.clone(), notifier);
        ctx.state().set_specification("spec");
        let reviewer = Reviewer::new(1);

        let first = reviewer.handle(&mut ctx, code("v1")).await.unwrap();
        assert_eq!(first.kind(), EventKind::Review);

        let second = reviewer.handle(&mut ctx, code("v2")).await.unwrap();
        assert_eq!(second, Event::stop(AgentOutput::Unpackaged("v2".to_string())));
        assert_eq!(llm.call_count(), 1);

        assert_eq!(stream.recv().await.unwrap().msg, "Review #1: v1");
        assert_eq!(stream.recv().await.unwrap().msg, "Already reviewed 1 times, stopping!");
    }
}

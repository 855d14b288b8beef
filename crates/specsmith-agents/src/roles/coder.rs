use crate::{prompts, truncate, CodeAgentState};
use async_trait::async_trait;
use specsmith_core::*;

/// Revises the code according to the latest review
pub struct Coder;

#[async_trait]
impl Step<CodeAgentState, AgentOutput> for Coder {
    type Input = ReviewEvent;

    fn name(&self) -> &str {
        "coder"
    }

    async fn handle(
        &self,
        ctx: &mut RunContext<CodeAgentState>,
        input: ReviewEvent,
    ) -> Result<Event<AgentOutput>, WorkflowError> {
        let spec = ctx.state().specification()?.to_string();
        ctx.emit(format!("Update code based on review: {}", truncate(&input.review)));

        let prompt = prompts::coder(&spec, &input.code, &input.review);
        let code = ctx.llm().complete(&prompt).await?.text;
        tracing::debug!(chars = code.len(), "Code revised");
        Ok(Event::code(code))
    }
}

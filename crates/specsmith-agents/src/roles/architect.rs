use crate::{prompts, truncate, CodeAgentState};
use async_trait::async_trait;
use specsmith_core::*;

/// Writes the first full implementation from the specification
pub struct Architect;

#[async_trait]
impl Step<CodeAgentState, AgentOutput> for Architect {
    type Input = StartEvent;

    fn name(&self) -> &str {
        "architect"
    }

    async fn handle(
        &self,
        ctx: &mut RunContext<CodeAgentState>,
        input: StartEvent,
    ) -> Result<Event<AgentOutput>, WorkflowError> {
        ctx.state().set_specification(input.input);
        let spec = ctx.state().specification()?.to_string();
        ctx.emit(format!("Writing app using this specification: {}", truncate(&spec)));

        let code = ctx.llm().complete(&prompts::architect(&spec)).await?.text;
        tracing::debug!(chars = code.len(), "Initial code written");
        Ok(Event::code(code))
    }
}

use crate::{prompts, CodeAgentState};
use async_trait::async_trait;
use specsmith_core::*;
use specsmith_llm::ResponseFormat;
use std::sync::Arc;

/// Splits the approved code blob into files using a structured-output model
pub struct Packager {
    llm: Arc<dyn LlmBackend>,
}

impl Packager {
    /// `llm` should be a backend set up for JSON output, separate from the run's
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Step<CodeAgentState, AgentOutput> for Packager {
    type Input = PackageEvent;

    fn name(&self) -> &str {
        "packager"
    }

    async fn handle(
        &self,
        _ctx: &mut RunContext<CodeAgentState>,
        input: PackageEvent,
    ) -> Result<Event<AgentOutput>, WorkflowError> {
        let messages = prompts::packager(&input.code);
        let response = self.llm.chat(&messages, ResponseFormat::JsonObject).await?;

        let result = PackageResult::parse(response.content())?;
        tracing::info!(files = result.len(), model = self.llm.model(), "Code packaged");
        Ok(Event::stop(AgentOutput::Packaged(result)))
    }
}

//! The Specsmith code agent
//!
//! Four roles wired into one workflow: the [`Architect`] writes a first
//! implementation, the [`Reviewer`] and [`Coder`] iterate on it, and the
//! [`Packager`] splits the accepted code into files.
//!
//! ```text
//! Start -> Code -> { Review -> Code }* -> Package -> Stop
//!                \-> Stop (review limit reached)
//! ```

use serde::{Deserialize, Serialize};
use specsmith_core::*;
use std::sync::Arc;

pub use roles::*;
pub use state::CodeAgentState;

pub mod prompts;
mod roles;
mod state;

/// Reviews allowed before the reviewer gives up
pub const MAX_REVIEWS: u32 = 3;

/// Substring in a review that means the code is accepted
pub const ACCEPTANCE_MARKER: &str = "Looks great";

const NOTIFICATION_PREVIEW_CHARS: usize = 60;

/// Shorten `text` for a progress notification
pub fn truncate(text: &str) -> String {
    match text.char_indices().nth(NOTIFICATION_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Tunables for [`create_code_agent`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentOptions {
    pub max_reviews: u32,
    /// Engine-level step ceiling, none by default
    pub max_steps: Option<usize>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_reviews: MAX_REVIEWS,
            max_steps: None,
        }
    }
}

/// Build the code agent workflow.
///
/// `llm` serves the architect, coder and reviewer. `packager_llm` is used only
/// for file extraction and should be set up for JSON output.
pub fn create_code_agent(
    llm: Arc<dyn LlmBackend>,
    packager_llm: Arc<dyn LlmBackend>,
    options: AgentOptions,
) -> Result<Workflow<CodeAgentState, AgentOutput>, ConfigurationError> {
    let mut builder = WorkflowBuilder::new(llm);
    if let Some(limit) = options.max_steps {
        builder = builder.max_steps(limit);
    }

    let workflow = builder
        .add_step(Architect, [EventKind::Code])?
        .add_step(Coder, [EventKind::Code])?
        .add_step(
            Reviewer::new(options.max_reviews),
            [EventKind::Review, EventKind::Package, EventKind::Stop],
        )?
        .add_step(Packager::new(packager_llm), [EventKind::Stop])?
        .build()?;

    tracing::debug!(max_reviews = options.max_reviews, "Code agent created");
    Ok(workflow)
}

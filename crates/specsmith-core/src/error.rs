use specsmith_llm::LlmError;
use specsmith_types::{EventKind, ParseError};
use thiserror::Error;

/// Invalid dispatch wiring, detected before any run executes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("a step is already registered for {0} events")]
    DuplicateStep(EventKind),
    #[error("step '{step}' declares no output events")]
    NoOutputs { step: String },
    #[error("step '{step}' may produce {output} events but no step consumes them")]
    UnconsumedOutput { step: String, output: EventKind },
    #[error("run state '{0}' was read before any step set it")]
    MissingState(&'static str),
}

/// Errors that end a run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("No step registered for {0} events")]
    Unroutable(EventKind),
    #[error("Step '{step}' produced a {produced} event, declared outputs are {declared:?}")]
    UndeclaredOutput {
        step: String,
        produced: EventKind,
        declared: Vec<EventKind>,
    },
    #[error("Run exceeded the limit of {0} steps")]
    StepLimitExceeded(usize),
    #[error("Model backend error: {0}")]
    Backend(#[from] LlmError),
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),
    #[error("Run aborted: {0}")]
    RunAborted(String),
}

impl From<ParseError> for WorkflowError {
    fn from(error: ParseError) -> Self {
        WorkflowError::SchemaValidation(error.to_string())
    }
}

impl WorkflowError {
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, WorkflowError::Backend(LlmError::Unavailable(_)))
    }

    pub fn is_backend_timeout(&self) -> bool {
        matches!(self, WorkflowError::Backend(LlmError::Timeout(_)))
    }
}

use specsmith_core::ConfigurationError;
use std::sync::OnceLock;

/// Per-run state shared by the code agent's roles
#[derive(Debug, Default)]
pub struct CodeAgentState {
    specification: OnceLock<String>,
    review_count: u32,
}

impl CodeAgentState {
    /// Store the run's specification. Only the first call has any effect.
    pub fn set_specification(&self, spec: impl Into<String>) -> bool {
        let stored = self.specification.set(spec.into()).is_ok();
        if !stored {
            tracing::warn!("Specification already set for this run, keeping the first one");
        }
        stored
    }

    pub fn specification(&self) -> Result<&str, ConfigurationError> {
        self.specification
            .get()
            .map(String::as_str)
            .ok_or(ConfigurationError::MissingState("specification"))
    }

    pub fn review_count(&self) -> u32 {
        self.review_count
    }

    /// Count one more review, returning the new total
    pub fn increment_reviews(&mut self) -> u32 {
        self.review_count += 1;
        self.review_count
    }
}

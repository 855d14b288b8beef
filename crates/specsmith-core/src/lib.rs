//! Workflow engine for Specsmith
//!
//! A [`Workflow`] routes [`Event`]s to the [`Step`] registered for their
//! variant, one step at a time, until a step produces a `Stop` event. Steps
//! share a per-run [`RunContext`] and report progress through a buffered
//! notification channel that an observer can drain while the run is in
//! flight.

pub use context::*;
pub use error::*;
pub use step::*;
pub use stream::*;
pub use workflow::*;

mod context;
mod error;
mod step;
mod stream;
mod workflow;

/// Re-export common types
pub use specsmith_llm::LlmBackend;
pub use specsmith_types::*;

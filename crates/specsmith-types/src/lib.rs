//! Core types for the Specsmith workflow
//!
//! Events are the vocabulary of the workflow state machine; file records are
//! what the packager hands back once the code has been approved.

pub use events::*;
pub use files::*;

mod events;
mod files;

//! Test utilities for Specsmith
//!
//! [`MockLlm`] stands in for a model backend with scripted replies and a
//! record of every call; [`NotificationAssertions`] checks what a run
//! streamed; [`fixtures`] holds canned specifications and packager replies.

pub use assertions::*;
pub use llm_mock::*;

mod assertions;
pub mod fixtures;
mod llm_mock;

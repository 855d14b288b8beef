//! Error recovery tests
//!
//! Backend failures, malformed packager output and retry behavior seen
//! through a full code agent run.

use futures::StreamExt;
use specsmith_agents::*;
use specsmith_core::*;
use specsmith_llm::{LlmError, RetryPolicy, RetryingBackend};
use specsmith_test_utils::*;
use std::sync::Arc;
use std::time::Duration;

fn fast_retries(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        backoff_multiplier: 1.0,
        max_backoff: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn test_backend_unavailable_fails_the_run() {
    println!("🧪 Testing Unavailable Backend");

    let llm = Arc::new(
        MockLlm::new().failing_with(LlmError::Unavailable("connection refused".to_string())),
    );
    let agent =
        create_code_agent(llm.clone(), Arc::new(MockLlm::new()), AgentOptions::default()).unwrap();

    let mut run = agent.run("spec");
    let notifications: Vec<MessageEvent> = run.stream_events().unwrap().collect().await;
    let error = run.await.unwrap_err();

    assert!(error.is_backend_unavailable());
    // The architect announced itself before calling the model
    assert_eq!(notifications.len(), 1);
    assert_eq!(llm.call_count(), 1);
    println!("✅ Run failed with the backend error, stream ended");

    println!("🎉 Unavailable Backend Test PASSED");
}

#[tokio::test]
async fn test_reviewer_timeout_mid_run() {
    let llm = Arc::new(
        MockLlm::new()
            .on_prompt("Build an app", ["code v1"])
            .on_prompt_fail("Review this code", LlmError::Timeout(Duration::from_secs(300))),
    );
    let agent = create_code_agent(llm, Arc::new(MockLlm::new()), AgentOptions::default()).unwrap();

    let error = agent.run("spec").await.unwrap_err();
    assert!(error.is_backend_timeout());
    assert_eq!(error, WorkflowError::Backend(LlmError::Timeout(Duration::from_secs(300))));
}

#[tokio::test]
async fn test_malformed_package_output_is_schema_error() {
    println!("🧪 Testing Malformed Packager Output");

    let llm = Arc::new(
        MockLlm::new()
            .on_prompt("Build an app", ["code v1"])
            .on_prompt("Review this code", ["Looks great"]),
    );
    let packager = Arc::new(MockLlm::new().on_chat("{\"files\": \"not a list\"}"));
    let agent = create_code_agent(llm, packager, AgentOptions::default()).unwrap();

    let error = agent.run("spec").await.unwrap_err();
    assert!(matches!(error, WorkflowError::SchemaValidation(_)));
    println!("✅ Schema violation reported as SchemaValidation");

    println!("🎉 Malformed Packager Output Test PASSED");
}

#[tokio::test]
async fn test_retrying_backend_recovers_transient_failures() {
    println!("🧪 Testing Retry Around Flaky Backend");

    let flaky = Arc::new(
        MockLlm::new()
            .on_prompt_script(
                "Build an app",
                [
                    Err(LlmError::Unavailable("503".to_string())),
                    Err(LlmError::Timeout(Duration::from_secs(1))),
                    Ok("code v1".to_string()),
                ],
            )
            .on_prompt("Review this code", ["Looks great"]),
    );
    let packager = Arc::new(
        MockLlm::new().on_chat(fixtures::package_reply(&[("main.rs", "fn main() {}")])),
    );
    let agent = create_code_agent(
        Arc::new(RetryingBackend::new(flaky.clone(), fast_retries(3))),
        packager,
        AgentOptions::default(),
    )
    .unwrap();

    let output = agent.run("spec").await.unwrap();

    assert!(output.is_packaged());
    assert_eq!(flaky.prompts_containing("Build an app"), 3);
    println!("✅ Architect call succeeded on the third attempt");

    println!("🎉 Retry Around Flaky Backend Test PASSED");
}

#[tokio::test]
async fn test_non_retryable_errors_are_not_retried() {
    let llm = Arc::new(MockLlm::new().on_prompt_fail(
        "Build an app",
        LlmError::Api {
            status: 401,
            message: "invalid api key".to_string(),
        },
    ));
    let agent = create_code_agent(
        Arc::new(RetryingBackend::new(llm.clone(), fast_retries(5))),
        Arc::new(MockLlm::new()),
        AgentOptions::default(),
    )
    .unwrap();

    let error = agent.run("spec").await.unwrap_err();

    assert!(matches!(error, WorkflowError::Backend(LlmError::Api { status: 401, .. })));
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_retries_exhausted_surface_last_error() {
    let llm = Arc::new(
        MockLlm::new().failing_with(LlmError::Unavailable("overloaded".to_string())),
    );
    let agent = create_code_agent(
        Arc::new(RetryingBackend::new(llm.clone(), fast_retries(2))),
        Arc::new(MockLlm::new()),
        AgentOptions::default(),
    )
    .unwrap();

    let error = agent.run("spec").await.unwrap_err();

    assert!(error.is_backend_unavailable());
    assert_eq!(llm.call_count(), 2);
}

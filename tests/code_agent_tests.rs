//! End-to-end code agent tests
//!
//! Runs the full architect/reviewer/coder/packager workflow against scripted
//! backends and checks the result, the notification stream and the model
//! traffic together.

use futures::StreamExt;
use specsmith_agents::*;
use specsmith_core::*;
use specsmith_test_utils::*;
use std::sync::Arc;

const ARCHITECT: &str = "Build an app for this specification";
const CODER: &str = "We need to improve code";
const REVIEWER: &str = "Review this code";

#[tokio::test]
async fn test_first_review_accepted_packages_files() {
    println!("🧪 Testing Accepted First Review");

    let llm = Arc::new(
        MockLlm::new()
            .on_prompt(ARCHITECT, [fixtures::HELLO_WORLD_CODE])
            .on_prompt(REVIEWER, ["Looks great"]),
    );
    let packager = Arc::new(MockLlm::new().on_chat(fixtures::hello_world_package_reply()));
    let agent = create_code_agent(llm.clone(), packager.clone(), AgentOptions::default()).unwrap();

    let mut run = agent.run(fixtures::HELLO_WORLD_SPEC);
    let notifications: Vec<MessageEvent> = run.stream_events().unwrap().collect().await;
    let output = run.await.unwrap();

    assert_eq!(output, AgentOutput::Packaged(fixtures::hello_world_files()));
    println!("✅ Packaged {} file(s)", fixtures::hello_world_files().len());

    let review_line = format!("Review #1: {}", fixtures::HELLO_WORLD_CODE);
    NotificationAssertions::messages_are(
        &notifications,
        &[
            "Writing app using this specification: Build a hello-world CLI.",
            review_line.as_str(),
            "Reviewer says: Looks great",
        ],
    );
    println!("✅ Notifications streamed in order");

    assert_eq!(llm.prompts_containing(ARCHITECT), 1);
    assert_eq!(llm.prompts_containing(REVIEWER), 1);
    assert_eq!(llm.prompts_containing(CODER), 0);
    NotificationAssertions::backend_calls(&packager, CallKind::Chat, 1);
    NotificationAssertions::backend_calls(&llm, CallKind::Chat, 0);
    println!("✅ One architect call, one review, one packaging call");

    println!("🎉 Accepted First Review Test PASSED");
}

#[tokio::test]
async fn test_review_limit_returns_last_code_unpackaged() {
    println!("🧪 Testing Review Limit");

    let versions = fixtures::code_versions(4);
    let llm = Arc::new(
        MockLlm::new()
            .on_prompt(ARCHITECT, [versions[0].clone()])
            .on_prompt(CODER, versions[1..].to_vec())
            .on_prompt(REVIEWER, ["Please add error handling"]),
    );
    let packager = Arc::new(MockLlm::new());
    let agent = create_code_agent(llm.clone(), packager.clone(), AgentOptions::default()).unwrap();

    let mut run = agent.run("Build a hello-world CLI.");
    let notifications: Vec<MessageEvent> = run.stream_events().unwrap().collect().await;
    let output = run.await.unwrap();

    assert_eq!(output, AgentOutput::Unpackaged("code v4".to_string()));
    println!("✅ Last code returned verbatim");

    NotificationAssertions::messages_are(
        &notifications,
        &[
            "Writing app using this specification: Build a hello-world CLI.",
            "Review #1: code v1",
            "Update code based on review: Please add error handling",
            "Review #2: code v2",
            "Update code based on review: Please add error handling",
            "Review #3: code v3",
            "Update code based on review: Please add error handling",
            "Already reviewed 3 times, stopping!",
        ],
    );

    // architect + 3 reviews + 3 revisions, the fourth review never reaches the model
    assert_eq!(llm.calls_of(CallKind::Complete).len(), 7);
    assert_eq!(packager.call_count(), 0);
    println!("✅ Packager skipped after the review limit");

    println!("🎉 Review Limit Test PASSED");
}

#[tokio::test]
async fn test_revision_prompts_carry_spec_code_and_review() {
    let llm = Arc::new(
        MockLlm::new()
            .on_prompt(ARCHITECT, ["code v1"])
            .on_prompt(CODER, ["code v2"])
            .on_prompt(REVIEWER, ["Rename main", "Looks great, ship it"]),
    );
    let packager =
        Arc::new(MockLlm::new().on_chat(fixtures::package_reply(&[("main.py", "code v2")])));
    let agent = create_code_agent(llm.clone(), packager.clone(), AgentOptions::default()).unwrap();

    let output = agent.run("a tiny app").await.unwrap();
    assert_eq!(output.files().map(|files| files.len()), Some(1));

    let calls = llm.calls();
    let revision = calls.iter().find(|c| c.prompt.starts_with(CODER)).unwrap();
    assert!(revision.prompt.contains("<spec>a tiny app</spec>"));
    assert!(revision.prompt.contains("<code>code v1</code>"));
    assert!(revision.prompt.contains("<review>Rename main</review>"));

    // The accepted code, not the first draft, goes to the packager
    let chats = packager.calls_of(CallKind::Chat);
    assert!(chats[0].prompt.contains("------\ncode v2\n------"));
}

#[tokio::test]
async fn test_concurrent_runs_keep_separate_state() {
    println!("🧪 Testing Concurrent Runs");

    let llm = Arc::new(
        MockLlm::new()
            .on_prompt(ARCHITECT, ["draft"])
            .on_prompt(CODER, ["revised"])
            .on_prompt(REVIEWER, ["Needs work"]),
    );
    let options = AgentOptions {
        max_reviews: 2,
        ..AgentOptions::default()
    };
    let agent = create_code_agent(llm.clone(), Arc::new(MockLlm::new()), options).unwrap();

    let runs: Vec<_> = (0..4).map(|i| agent.run(format!("spec {}", i))).collect();
    let mut ids: Vec<_> = runs.iter().map(|run| run.run_id()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);

    for run in runs {
        let output = run.await.unwrap();
        assert_eq!(output, AgentOutput::Unpackaged("revised".to_string()));
    }

    // Each run: architect, two reviews, two revisions
    assert_eq!(llm.call_count(), 4 * 5);
    println!("✅ Review counters did not leak between runs");

    println!("🎉 Concurrent Runs Test PASSED");
}

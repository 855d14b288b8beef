use crate::{CallKind, MockLlm};
use specsmith_llm::LlmBackend;
use specsmith_types::*;

/// Assertion helpers for run notifications and backend traffic
pub struct NotificationAssertions;

impl NotificationAssertions {
    /// Assert that the streamed messages are exactly `expected`, in order
    pub fn messages_are(events: &[MessageEvent], expected: &[&str]) {
        let actual: Vec<&str> = events.iter().map(|e| e.msg.as_str()).collect();
        assert_eq!(
            actual, expected,
            "Notification sequence differs from expected"
        );
    }

    /// Assert that each needle occurs in some message, and in this order
    pub fn contains_in_order(events: &[MessageEvent], needles: &[&str]) {
        let mut remaining = events.iter();
        for needle in needles {
            assert!(
                remaining.any(|e| e.msg.contains(needle)),
                "Expected a notification containing '{}' after the previous match, got {:?}",
                needle,
                events.iter().map(|e| e.msg.as_str()).collect::<Vec<_>>()
            );
        }
    }

    /// Assert that `count` messages start with `prefix`
    pub fn count_starting_with(events: &[MessageEvent], prefix: &str, count: usize) {
        let actual = events.iter().filter(|e| e.msg.starts_with(prefix)).count();
        assert_eq!(
            actual, count,
            "Expected {} notifications starting with '{}', found {}",
            count, prefix, actual
        );
    }

    /// Assert that the final message is `expected`
    pub fn last_is(events: &[MessageEvent], expected: &str) {
        match events.last() {
            Some(last) => assert_eq!(last.msg, expected, "Unexpected final notification"),
            None => panic!("No notifications were streamed, expected final '{}'", expected),
        }
    }

    /// Assert that `partial` is a prefix of `full`, as seen by a late or early observer
    pub fn is_prefix_of(partial: &[MessageEvent], full: &[MessageEvent]) {
        assert!(
            partial.len() <= full.len() && partial == &full[..partial.len()],
            "Notifications {:?} are not a prefix of {:?}",
            partial,
            full
        );
    }

    /// Assert how many calls of `kind` reached the backend
    pub fn backend_calls(llm: &MockLlm, kind: CallKind, expected: usize) {
        let actual = llm.calls_of(kind).len();
        assert_eq!(
            actual, expected,
            "Expected {} {:?} calls to '{}', found {}",
            expected, kind, llm.model(), actual
        );
    }
}

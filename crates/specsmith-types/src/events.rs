use serde::{Deserialize, Serialize};
use std::fmt;

/// Kick-off payload carrying the user's specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartEvent {
    pub input: String,
}

/// A full candidate implementation as a single text blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEvent {
    pub code: String,
}

/// Critique paired with the code it critiques
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub review: String,
    pub code: String,
}

/// Approved code awaiting extraction into files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEvent {
    pub code: String,
}

/// Terminal payload, ends the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopEvent<T> {
    pub result: T,
}

/// Out-of-band progress notification. Never dispatched, only streamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub msg: String,
}

impl MessageEvent {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl fmt::Display for MessageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}

/// Every event the dispatch loop can route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event<T> {
    Start(StartEvent),
    Code(CodeEvent),
    Review(ReviewEvent),
    Package(PackageEvent),
    Stop(StopEvent<T>),
}

/// Discriminant of [`Event`], used for registration and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    Start,
    Code,
    Review,
    Package,
    Stop,
}

impl EventKind {
    /// All kinds in state machine order
    pub const ALL: [EventKind; 5] = [
        EventKind::Start,
        EventKind::Code,
        EventKind::Review,
        EventKind::Package,
        EventKind::Stop,
    ];

    /// Whether producing this kind ends the run
    pub fn is_terminal(self) -> bool {
        matches!(self, EventKind::Stop)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Start => "Start",
            EventKind::Code => "Code",
            EventKind::Review => "Review",
            EventKind::Package => "Package",
            EventKind::Stop => "Stop",
        };
        f.write_str(name)
    }
}

impl<T> Event<T> {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Start(_) => EventKind::Start,
            Event::Code(_) => EventKind::Code,
            Event::Review(_) => EventKind::Review,
            Event::Package(_) => EventKind::Package,
            Event::Stop(_) => EventKind::Stop,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    pub fn start(input: impl Into<String>) -> Self {
        Event::Start(StartEvent { input: input.into() })
    }

    pub fn code(code: impl Into<String>) -> Self {
        Event::Code(CodeEvent { code: code.into() })
    }

    pub fn review(review: impl Into<String>, code: impl Into<String>) -> Self {
        Event::Review(ReviewEvent {
            review: review.into(),
            code: code.into(),
        })
    }

    pub fn package(code: impl Into<String>) -> Self {
        Event::Package(PackageEvent { code: code.into() })
    }

    pub fn stop(result: T) -> Self {
        Event::Stop(StopEvent { result })
    }
}

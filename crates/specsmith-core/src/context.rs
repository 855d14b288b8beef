use crate::stream::Notifier;
use specsmith_llm::LlmBackend;
use specsmith_types::MessageEvent;
use std::sync::Arc;
use uuid::Uuid;

/// State shared by every step of one run.
///
/// Created when the run starts and dropped when it ends. Steps execute one
/// at a time, so the typed state needs no locking.
pub struct RunContext<S> {
    run_id: Uuid,
    state: S,
    llm: Arc<dyn LlmBackend>,
    notifier: Notifier,
}

impl<S> RunContext<S> {
    pub fn new(state: S, llm: Arc<dyn LlmBackend>, notifier: Notifier) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state,
            llm,
            notifier,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Backend handle the workflow was built with
    pub fn llm(&self) -> &dyn LlmBackend {
        self.llm.as_ref()
    }

    /// Send a progress notification to the run's observer
    pub fn emit(&self, msg: impl Into<String>) {
        self.notifier.emit(MessageEvent::new(msg));
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for RunContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("state", &self.state)
            .field("model", &self.llm.model())
            .finish()
    }
}

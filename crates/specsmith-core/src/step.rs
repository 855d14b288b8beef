//! Step handlers and the table that routes events to them

use crate::context::RunContext;
use crate::error::WorkflowError;
use async_trait::async_trait;
use specsmith_types::*;
use std::sync::Arc;

/// Handler invoked when an event of its input variant is dispatched.
///
/// A step consumes exactly one event and returns exactly one event. Any
/// branching happens inside the step by choosing which variant to return.
#[async_trait]
pub trait Step<S: Send + 'static, T: Send + 'static>: Send + Sync {
    /// Payload this step consumes; fixes the variant it is registered for
    type Input: Routable<S, T>;

    /// Name used in logs and wiring errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn handle(
        &self,
        ctx: &mut RunContext<S>,
        input: Self::Input,
    ) -> Result<Event<T>, WorkflowError>;
}

/// A step together with the outputs it declared at registration
pub struct Registration<S: Send + 'static, T: Send + 'static, E: Routable<S, T>> {
    pub(crate) name: String,
    pub(crate) step: Arc<dyn Step<S, T, Input = E>>,
    pub(crate) outputs: Vec<EventKind>,
}

impl<S: Send + 'static, T: Send + 'static, E: Routable<S, T>> Registration<S, T, E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outputs(&self) -> &[EventKind] {
        &self.outputs
    }
}

/// One slot per dispatchable variant. `Stop` has no slot: it ends the run.
pub struct StepTable<S: Send + 'static, T: Send + 'static> {
    pub(crate) start: Option<Registration<S, T, StartEvent>>,
    pub(crate) code: Option<Registration<S, T, CodeEvent>>,
    pub(crate) review: Option<Registration<S, T, ReviewEvent>>,
    pub(crate) package: Option<Registration<S, T, PackageEvent>>,
}

impl<S: Send + 'static, T: Send + 'static> Default for StepTable<S, T> {
    fn default() -> Self {
        Self {
            start: None,
            code: None,
            review: None,
            package: None,
        }
    }
}

impl<S: Send + 'static, T: Send + 'static> StepTable<S, T> {
    pub fn is_registered(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Start => self.start.is_some(),
            EventKind::Code => self.code.is_some(),
            EventKind::Review => self.review.is_some(),
            EventKind::Package => self.package.is_some(),
            EventKind::Stop => false,
        }
    }

    /// `(input kind, step name, declared outputs)` for every registered step
    pub fn entries(&self) -> Vec<(EventKind, &str, &[EventKind])> {
        let mut entries = Vec::new();
        if let Some(r) = &self.start {
            entries.push((EventKind::Start, r.name(), r.outputs()));
        }
        if let Some(r) = &self.code {
            entries.push((EventKind::Code, r.name(), r.outputs()));
        }
        if let Some(r) = &self.review {
            entries.push((EventKind::Review, r.name(), r.outputs()));
        }
        if let Some(r) = &self.package {
            entries.push((EventKind::Package, r.name(), r.outputs()));
        }
        entries
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for specsmith_types::StartEvent {}
    impl Sealed for specsmith_types::CodeEvent {}
    impl Sealed for specsmith_types::ReviewEvent {}
    impl Sealed for specsmith_types::PackageEvent {}
}

/// Payloads that can be routed to a step
pub trait Routable<S: Send + 'static, T: Send + 'static>: sealed::Sealed + Send + Sized + 'static {
    const KIND: EventKind;

    #[doc(hidden)]
    fn slot(table: &mut StepTable<S, T>) -> &mut Option<Registration<S, T, Self>>;
}

impl<S: Send + 'static, T: Send + 'static> Routable<S, T> for StartEvent {
    const KIND: EventKind = EventKind::Start;

    fn slot(table: &mut StepTable<S, T>) -> &mut Option<Registration<S, T, Self>> {
        &mut table.start
    }
}

impl<S: Send + 'static, T: Send + 'static> Routable<S, T> for CodeEvent {
    const KIND: EventKind = EventKind::Code;

    fn slot(table: &mut StepTable<S, T>) -> &mut Option<Registration<S, T, Self>> {
        &mut table.code
    }
}

impl<S: Send + 'static, T: Send + 'static> Routable<S, T> for ReviewEvent {
    const KIND: EventKind = EventKind::Review;

    fn slot(table: &mut StepTable<S, T>) -> &mut Option<Registration<S, T, Self>> {
        &mut table.review
    }
}

impl<S: Send + 'static, T: Send + 'static> Routable<S, T> for PackageEvent {
    const KIND: EventKind = EventKind::Package;

    fn slot(table: &mut StepTable<S, T>) -> &mut Option<Registration<S, T, Self>> {
        &mut table.package
    }
}

//! Workflow construction and the dispatch loop

use crate::context::RunContext;
use crate::error::{ConfigurationError, WorkflowError};
use crate::step::*;
use crate::stream::{notification_channel, NotificationStream};
use futures::future::BoxFuture;
use specsmith_llm::LlmBackend;
use specsmith_types::*;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

/// Collects step registrations and checks the wiring.
///
/// Validation is on by default. Toggle it with [`WorkflowBuilder::validate`]
/// before adding steps, since the empty-outputs check runs at registration.
pub struct WorkflowBuilder<S: Send + 'static, T: Send + 'static> {
    llm: Arc<dyn LlmBackend>,
    table: StepTable<S, T>,
    validate: bool,
    max_steps: Option<usize>,
}

impl<S: Send + 'static, T: Send + 'static> WorkflowBuilder<S, T> {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self {
            llm,
            table: StepTable::default(),
            validate: true,
            max_steps: None,
        }
    }

    /// Enable or disable wiring validation
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Fail any run that dispatches more than `limit` steps.
    ///
    /// The engine imposes no ceiling by default; termination is up to the
    /// steps themselves.
    pub fn max_steps(mut self, limit: usize) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// Register `step` for its input variant, declaring which variants it may return
    pub fn add_step<H>(
        mut self,
        step: H,
        outputs: impl IntoIterator<Item = EventKind>,
    ) -> Result<Self, ConfigurationError>
    where
        H: Step<S, T> + 'static,
    {
        let kind = <H::Input as Routable<S, T>>::KIND;
        let name = step.name().to_string();
        let mut outputs: Vec<EventKind> = outputs.into_iter().collect();
        outputs.sort();
        outputs.dedup();

        let slot = <H::Input as Routable<S, T>>::slot(&mut self.table);
        if slot.is_some() {
            return Err(ConfigurationError::DuplicateStep(kind));
        }
        if self.validate && outputs.is_empty() {
            return Err(ConfigurationError::NoOutputs { step: name });
        }

        tracing::debug!(step = %name, input = %kind, ?outputs, "Registered step");
        *slot = Some(Registration {
            name,
            step: Arc::new(step),
            outputs,
        });
        Ok(self)
    }

    /// Finish construction, checking that every declared output is either
    /// terminal or consumed by a registered step
    pub fn build(self) -> Result<Workflow<S, T>, ConfigurationError> {
        if self.validate {
            for (_, name, outputs) in self.table.entries() {
                if outputs.is_empty() {
                    return Err(ConfigurationError::NoOutputs { step: name.to_string() });
                }
                for output in outputs {
                    if !output.is_terminal() && !self.table.is_registered(*output) {
                        return Err(ConfigurationError::UnconsumedOutput {
                            step: name.to_string(),
                            output: *output,
                        });
                    }
                }
            }
        }

        Ok(Workflow {
            inner: Arc::new(WorkflowInner {
                llm: self.llm,
                table: self.table,
                validate: self.validate,
                max_steps: self.max_steps,
            }),
        })
    }
}

struct WorkflowInner<S: Send + 'static, T: Send + 'static> {
    llm: Arc<dyn LlmBackend>,
    table: StepTable<S, T>,
    validate: bool,
    max_steps: Option<usize>,
}

/// A validated set of steps, ready to run any number of times
pub struct Workflow<S: Send + 'static, T: Send + 'static> {
    inner: Arc<WorkflowInner<S, T>>,
}

impl<S: Send + 'static, T: Send + 'static> Clone for Workflow<S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, T> Workflow<S, T>
where
    S: Default + Send + 'static,
    T: Send + 'static,
{
    pub fn builder(llm: Arc<dyn LlmBackend>) -> WorkflowBuilder<S, T> {
        WorkflowBuilder::new(llm)
    }

    /// Variants with a registered step
    pub fn registered(&self) -> Vec<EventKind> {
        self.inner.table.entries().into_iter().map(|(kind, _, _)| kind).collect()
    }

    /// Start a run on the tokio runtime.
    ///
    /// The run proceeds whether or not anyone awaits the handle or reads its
    /// notifications.
    pub fn run(&self, input: impl Into<String>) -> RunHandle<T> {
        let (notifier, notifications) = notification_channel();
        let mut ctx = RunContext::new(S::default(), Arc::clone(&self.inner.llm), notifier);
        let run_id = ctx.run_id();
        let inner = Arc::clone(&self.inner);
        let start = Event::start(input);

        let span = tracing::info_span!("run", %run_id);
        let task = tokio::spawn(
            async move {
                tracing::info!("Run started");
                let result = inner.dispatch(&mut ctx, start).await;
                match &result {
                    Ok(_) => tracing::info!("Run completed"),
                    Err(e) => tracing::warn!("Run failed: {}", e),
                }
                result
            }
            .instrument(span),
        );

        RunHandle {
            run_id,
            notifications: Some(notifications),
            task,
        }
    }

    /// Drive an existing context from `event` to a terminal event on the
    /// current task
    pub async fn execute(
        &self,
        ctx: &mut RunContext<S>,
        event: Event<T>,
    ) -> Result<T, WorkflowError> {
        self.inner.dispatch(ctx, event).await
    }
}

impl<S: Send + 'static, T: Send + 'static> WorkflowInner<S, T> {
    async fn dispatch(
        &self,
        ctx: &mut RunContext<S>,
        mut event: Event<T>,
    ) -> Result<T, WorkflowError> {
        let mut steps = 0usize;

        loop {
            if let Some(limit) = self.max_steps {
                if steps >= limit && !event.is_terminal() {
                    return Err(WorkflowError::StepLimitExceeded(limit));
                }
            }

            event = match event {
                Event::Start(input) => self.invoke(self.table.start.as_ref(), ctx, input).await?,
                Event::Code(input) => self.invoke(self.table.code.as_ref(), ctx, input).await?,
                Event::Review(input) => self.invoke(self.table.review.as_ref(), ctx, input).await?,
                Event::Package(input) => {
                    self.invoke(self.table.package.as_ref(), ctx, input).await?
                }
                Event::Stop(stop) => {
                    tracing::debug!(steps, "Terminal event reached");
                    return Ok(stop.result);
                }
            };
            steps += 1;
        }
    }

    async fn invoke<E: Routable<S, T>>(
        &self,
        registration: Option<&Registration<S, T, E>>,
        ctx: &mut RunContext<S>,
        input: E,
    ) -> Result<Event<T>, WorkflowError> {
        let registration = registration.ok_or(WorkflowError::Unroutable(E::KIND))?;
        tracing::debug!(step = %registration.name, input = %E::KIND, "Dispatching");

        let output = registration.step.handle(ctx, input).await?;
        let produced = output.kind();

        if self.validate && !registration.outputs.contains(&produced) {
            return Err(WorkflowError::UndeclaredOutput {
                step: registration.name.clone(),
                produced,
                declared: registration.outputs.clone(),
            });
        }

        tracing::debug!(step = %registration.name, output = %produced, "Step finished");
        Ok(output)
    }
}

/// Handle to an in-flight run.
///
/// Await it (it implements [`IntoFuture`]) for the terminal payload. The
/// notification stream can be taken once with [`RunHandle::stream_events`].
/// Dropping the handle does not stop the run.
pub struct RunHandle<T> {
    run_id: Uuid,
    notifications: Option<NotificationStream>,
    task: JoinHandle<Result<T, WorkflowError>>,
}

impl<T: Send + 'static> RunHandle<T> {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Take the run's notification stream. Returns `None` after the first call.
    pub fn stream_events(&mut self) -> Option<NotificationStream> {
        self.notifications.take()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal payload
    pub async fn result(self) -> Result<T, WorkflowError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(WorkflowError::RunAborted(e.to_string())),
        }
    }
}

impl<T: Send + 'static> IntoFuture for RunHandle<T> {
    type Output = Result<T, WorkflowError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.result())
    }
}

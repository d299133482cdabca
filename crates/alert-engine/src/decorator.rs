//! Alert decoration pipeline.
//!
//! A decorated alert is a linear chain of wrappers around a base
//! [`AlertEvent`]. Each layer may extend the condition text and adds its own
//! behaviour around delivery; the sink always receives the view rendered by
//! the outermost layer, with the chain's priority alongside it as data.

use crate::policy::AlertPolicy;
use crate::shutdown::ShutdownSignal;
use async_trait::async_trait;
use std::time::Duration;
use vitals_core::{AlertEvent, AlertSink, DispatchError, DispatchedAlert, Priority, SinkError};

/// Outcome of dispatching one (possibly repeated) alert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Sink calls made
    pub attempts: u32,
    /// Sink calls that succeeded
    pub delivered: u32,
    /// Failures, one per failed sink call. Never retried.
    pub failures: Vec<SinkError>,
    /// A repetition loop stopped early on shutdown
    pub cancelled: bool,
}

impl DispatchReport {
    pub fn merge(&mut self, other: DispatchReport) {
        self.attempts += other.attempts;
        self.delivered += other.delivered;
        self.failures.extend(other.failures);
        self.cancelled |= other.cancelled;
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold failures into an error for callers that want `?`
    pub fn into_result(self, patient_id: &str) -> Result<DispatchReport, DispatchError> {
        match self.failures.first() {
            None => Ok(self),
            Some(first) => Err(DispatchError::Sink {
                patient_id: patient_id.to_string(),
                attempts: self.attempts,
                failed: self.failures.len(),
                first: first.clone(),
            }),
        }
    }
}

/// Common surface of base alerts and their decorators
#[async_trait]
pub trait AlertComponent: Send + Sync {
    fn patient_id(&self) -> &str;
    fn condition(&self) -> String;
    fn timestamp_ms(&self) -> i64;

    /// Priority assigned somewhere in the chain, if any
    fn priority(&self) -> Option<Priority> {
        None
    }

    /// Deliver `view` according to this layer's policy
    async fn deliver(
        &self,
        view: &DispatchedAlert,
        sink: &dyn AlertSink,
        shutdown: &ShutdownSignal,
    ) -> DispatchReport;

    /// The alert text as the sink will see it
    fn render(&self) -> AlertEvent {
        AlertEvent::new(self.patient_id(), self.condition(), self.timestamp_ms())
    }

    async fn dispatch(&self, sink: &dyn AlertSink, shutdown: &ShutdownSignal) -> DispatchReport {
        let view = DispatchedAlert::new(self.render(), self.priority());
        self.deliver(&view, sink, shutdown).await
    }
}

#[async_trait]
impl AlertComponent for AlertEvent {
    fn patient_id(&self) -> &str {
        &self.patient_id
    }

    fn condition(&self) -> String {
        self.condition.clone()
    }

    fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    async fn deliver(
        &self,
        view: &DispatchedAlert,
        sink: &dyn AlertSink,
        _shutdown: &ShutdownSignal,
    ) -> DispatchReport {
        let mut report = DispatchReport {
            attempts: 1,
            ..Default::default()
        };
        match sink.dispatch(view).await {
            Ok(()) => report.delivered = 1,
            Err(e) => {
                tracing::warn!(
                    sink = sink.name(),
                    patient_id = %view.event.patient_id,
                    condition = %view.event.condition,
                    "Failed to dispatch alert: {}",
                    e
                );
                report.failures.push(e);
            }
        }
        report
    }
}

/// Prefixes the condition with `[PRIORITY] ` and announces the priority
/// before each delivery.
#[derive(Debug, Clone)]
pub struct PriorityDecorator<C> {
    inner: C,
    priority: Priority,
}

impl<C: AlertComponent> PriorityDecorator<C> {
    pub fn new(inner: C, priority: Priority) -> Self {
        Self { inner, priority }
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: AlertComponent> AlertComponent for PriorityDecorator<C> {
    fn patient_id(&self) -> &str {
        self.inner.patient_id()
    }

    fn condition(&self) -> String {
        format!("[{}] {}", self.priority, self.inner.condition())
    }

    fn timestamp_ms(&self) -> i64 {
        self.inner.timestamp_ms()
    }

    fn priority(&self) -> Option<Priority> {
        Some(self.priority)
    }

    async fn deliver(
        &self,
        view: &DispatchedAlert,
        sink: &dyn AlertSink,
        shutdown: &ShutdownSignal,
    ) -> DispatchReport {
        tracing::info!(
            priority = %self.priority,
            patient_id = %view.event.patient_id,
            condition = %view.event.condition,
            "Triggering priority alert"
        );
        self.inner.deliver(view, sink, shutdown).await
    }
}

/// Delivers the wrapped alert `repeats` times, waiting `interval` between
/// deliveries. Shutdown ends the loop after the in-flight delivery.
#[derive(Debug, Clone)]
pub struct RepetitionDecorator<C> {
    inner: C,
    repeats: u32,
    interval: Duration,
}

impl<C: AlertComponent> RepetitionDecorator<C> {
    pub fn new(inner: C, repeats: u32, interval: Duration) -> Self {
        Self {
            inner,
            repeats,
            interval,
        }
    }

    pub fn repeats(&self) -> u32 {
        self.repeats
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: AlertComponent> AlertComponent for RepetitionDecorator<C> {
    fn patient_id(&self) -> &str {
        self.inner.patient_id()
    }

    fn condition(&self) -> String {
        self.inner.condition()
    }

    fn timestamp_ms(&self) -> i64 {
        self.inner.timestamp_ms()
    }

    fn priority(&self) -> Option<Priority> {
        self.inner.priority()
    }

    async fn deliver(
        &self,
        view: &DispatchedAlert,
        sink: &dyn AlertSink,
        shutdown: &ShutdownSignal,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        for attempt in 0..self.repeats {
            if attempt > 0 {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        tracing::debug!(
                            patient_id = %view.event.patient_id,
                            completed = attempt,
                            repeats = self.repeats,
                            "Repetition cancelled"
                        );
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            report.merge(self.inner.deliver(view, sink, shutdown).await);
        }
        report
    }
}

/// Fully decorated alert: priority innermost, repetition outermost
pub type DecoratedAlert = RepetitionDecorator<PriorityDecorator<AlertEvent>>;

/// Apply `policy` to `base`
pub fn decorate(base: AlertEvent, policy: &AlertPolicy) -> DecoratedAlert {
    RepetitionDecorator::new(
        PriorityDecorator::new(base, policy.priority),
        policy.repeats,
        policy.interval(),
    )
}

use crate::classifier::classify;
use crate::decorator::{decorate, AlertComponent, DecoratedAlert, DispatchReport};
use crate::detectors::{detect_all, DetectorConfig, RawTrigger};
use crate::factory::factory_for;
use crate::policy::PolicyTable;
use crate::shutdown::ShutdownSignal;
use record_store::PatientStore;
use std::sync::Arc;
use vitals_core::{AlertEvent, AlertSink, SinkError};

/// Totals for one patient's evaluate-and-dispatch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationSummary {
    pub patient_id: u32,
    /// Decorated alerts produced by detection
    pub alerts: usize,
    pub attempts: u32,
    pub delivered: u32,
    pub failures: Vec<SinkError>,
    /// Shutdown cut at least one repetition short
    pub cancelled: bool,
}

impl EvaluationSummary {
    fn absorb(&mut self, report: DispatchReport) {
        self.attempts += report.attempts;
        self.delivered += report.delivered;
        self.failures.extend(report.failures);
        self.cancelled |= report.cancelled;
    }
}

/// Runs the detection pipeline for one patient at a time.
///
/// Evaluation is pull-based: callers decide when a patient is evaluated and
/// the evaluator keeps no memory of earlier runs, so re-evaluating an
/// unchanged timeline yields the same alerts again.
#[derive(Clone)]
pub struct AlertEvaluator {
    store: Arc<PatientStore>,
    detectors: DetectorConfig,
    policies: PolicyTable,
}

impl AlertEvaluator {
    pub fn new(store: Arc<PatientStore>) -> Self {
        Self {
            store,
            detectors: DetectorConfig::default(),
            policies: PolicyTable::default(),
        }
    }

    pub fn with_detector_config(mut self, config: DetectorConfig) -> Self {
        self.detectors = config;
        self
    }

    pub fn with_policies(mut self, policies: PolicyTable) -> Self {
        self.policies = policies;
        self
    }

    pub fn store(&self) -> &Arc<PatientStore> {
        &self.store
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    /// Raw detector output for the patient's current timeline
    pub fn triggers(&self, patient_id: u32) -> Vec<RawTrigger> {
        let snapshot = self.store.snapshot(patient_id);
        let signals = classify(&snapshot);
        detect_all(&signals, &self.detectors)
    }

    fn label(&self, patient_id: &str, trigger: &RawTrigger) -> AlertEvent {
        let create = factory_for(trigger.kind.family());
        create(patient_id, trigger.condition(), trigger.timestamp_ms)
    }

    /// Family-labelled alerts, undecorated
    pub fn detect(&self, patient_id: u32) -> Vec<AlertEvent> {
        let id = patient_id.to_string();
        self.triggers(patient_id)
            .iter()
            .map(|t| self.label(&id, t))
            .collect()
    }

    /// Alerts ready to dispatch, highest priority first. Ties keep
    /// detection order.
    pub fn evaluate(&self, patient_id: u32) -> Vec<DecoratedAlert> {
        let id = patient_id.to_string();
        let mut alerts: Vec<DecoratedAlert> = self
            .triggers(patient_id)
            .iter()
            .map(|t| decorate(self.label(&id, t), &self.policies.get(t.kind)))
            .collect();

        alerts.sort_by(|a, b| b.inner().priority().cmp(&a.inner().priority()));

        if !alerts.is_empty() {
            tracing::info!(patient_id, alerts = alerts.len(), "Evaluation raised alerts");
        }
        alerts
    }

    pub async fn evaluate_and_dispatch(
        &self,
        patient_id: u32,
        sink: &dyn AlertSink,
        shutdown: &ShutdownSignal,
    ) -> EvaluationSummary {
        let alerts = self.evaluate(patient_id);
        dispatch_all(patient_id, &alerts, sink, shutdown).await
    }
}

/// Dispatch alerts one after another. Once shutdown is triggered each
/// remaining alert is still delivered once, but no repeats are waited for.
pub async fn dispatch_all(
    patient_id: u32,
    alerts: &[DecoratedAlert],
    sink: &dyn AlertSink,
    shutdown: &ShutdownSignal,
) -> EvaluationSummary {
    let mut summary = EvaluationSummary {
        patient_id,
        alerts: alerts.len(),
        ..Default::default()
    };
    for alert in alerts {
        summary.absorb(alert.dispatch(sink, shutdown).await);
    }

    if !summary.failures.is_empty() {
        tracing::warn!(
            patient_id,
            failed = summary.failures.len(),
            attempts = summary.attempts,
            "Some alert dispatches failed"
        );
    }
    summary
}

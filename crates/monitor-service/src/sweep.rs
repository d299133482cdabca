use alert_engine::{AlertEvaluator, EvaluationSummary, ShutdownSignal};
use record_store::PatientStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use vitals_core::AlertSink;

/// Remembers the timeline revision each patient was last evaluated at, so
/// unchanged timelines are not evaluated (and re-alerted) again. Corrected
/// values move the revision just as new readings do.
///
/// `changed` only proposes patients; a patient counts as evaluated once
/// `complete` is called for it, so patients skipped by a sweep come back.
#[derive(Debug, Default)]
pub struct SweepTracker {
    seen: HashMap<u32, u64>,
    pending: HashMap<u32, u64>,
}

impl SweepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patients whose timeline changed since they were last completed,
    /// ascending
    pub fn changed(&mut self, store: &PatientStore) -> Vec<u32> {
        self.pending.clear();
        let mut ids = Vec::new();
        for id in store.patient_ids() {
            let revision = store.revision(id);
            if self.seen.get(&id) != Some(&revision) {
                self.pending.insert(id, revision);
                ids.push(id);
            }
        }
        ids
    }

    /// Mark a patient from the last `changed` call as evaluated
    pub fn complete(&mut self, patient_id: u32) {
        if let Some(revision) = self.pending.remove(&patient_id) {
            self.seen.insert(patient_id, revision);
        }
    }
}

/// Evaluate and dispatch for every listed patient, one task per patient,
/// at most `limit` running at once. Patients not yet started when shutdown
/// fires get no summary; started ones finish their in-flight dispatch.
pub async fn run_sweep(
    evaluator: Arc<AlertEvaluator>,
    patients: Vec<u32>,
    sink: Arc<dyn AlertSink>,
    limit: Arc<Semaphore>,
    shutdown: ShutdownSignal,
) -> Vec<EvaluationSummary> {
    let mut tasks = JoinSet::new();

    for patient_id in patients {
        if shutdown.is_triggered() {
            tracing::info!(patient_id, "Shutdown requested, not starting further patients");
            break;
        }
        let permit = match Arc::clone(&limit).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!("Patient limiter closed: {}", e);
                break;
            }
        };

        let evaluator = Arc::clone(&evaluator);
        let sink = Arc::clone(&sink);
        let shutdown = shutdown.clone();
        tasks.spawn(async move {
            let _permit = permit;
            evaluator
                .evaluate_and_dispatch(patient_id, sink.as_ref(), &shutdown)
                .await
        });
    }

    let mut summaries = Vec::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(summary) => summaries.push(summary),
            Err(e) => tracing::error!("Patient evaluation task failed: {}", e),
        }
    }
    summaries.sort_by_key(|s| s.patient_id);
    summaries
}

//! In-memory patient record store.
//!
//! Holds one time-ordered timeline per patient plus the append-only alert
//! log. Timelines live in a `DashMap`, so reads and writes for one patient
//! are serialised by that patient's shard lock while other patients proceed
//! independently.

mod timeline;

pub use timeline::{PatientTimeline, Upsert};

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::RwLock;
use vitals_core::{AlertEvent, AlertSink, DispatchedAlert, Measurement, SinkError};

#[derive(Default)]
pub struct PatientStore {
    timelines: DashMap<u32, PatientTimeline>,
    alert_log: RwLock<Vec<AlertEvent>>,
}

impl PatientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingestion entry point. A reading with the same signal type and
    /// timestamp as an existing one replaces its value in place.
    pub fn add_measurement(&self, patient_id: u32, value: f64, signal: &str, timestamp_ms: i64) -> Upsert {
        let outcome = self
            .timelines
            .entry(patient_id)
            .or_insert_with(|| PatientTimeline::new(patient_id))
            .upsert(value, signal, timestamp_ms);

        tracing::debug!(
            patient_id,
            value,
            signal,
            timestamp_ms,
            ?outcome,
            "Stored measurement"
        );
        outcome
    }

    pub fn add(&self, measurement: &Measurement) -> Upsert {
        self.add_measurement(
            measurement.patient_id,
            measurement.value,
            &measurement.signal,
            measurement.timestamp_ms,
        )
    }

    /// Readings with `start_ms <= timestamp <= end_ms`, ascending by time.
    /// Unknown patients yield an empty list.
    pub fn records(&self, patient_id: u32, start_ms: i64, end_ms: i64) -> Vec<Measurement> {
        self.timelines
            .get(&patient_id)
            .map(|t| t.range(start_ms, end_ms))
            .unwrap_or_default()
    }

    /// Full timeline copy, taken under the patient's lock
    pub fn snapshot(&self, patient_id: u32) -> Vec<Measurement> {
        self.records(patient_id, i64::MIN, i64::MAX)
    }

    /// Known patient ids in ascending order
    pub fn patient_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.timelines.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn patient_count(&self) -> usize {
        self.timelines.len()
    }

    pub fn measurement_count(&self, patient_id: u32) -> usize {
        self.timelines.get(&patient_id).map(|t| t.len()).unwrap_or(0)
    }

    /// Content revision of the patient's timeline, 0 for unknown patients.
    /// Moves on new readings and on corrections that change a value.
    pub fn revision(&self, patient_id: u32) -> u64 {
        self.timelines.get(&patient_id).map(|t| t.revision()).unwrap_or(0)
    }

    pub fn append_alert(&self, event: AlertEvent) {
        self.alert_log
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    /// Copy of the alert log in dispatch order
    pub fn alert_log(&self) -> Vec<AlertEvent> {
        self.alert_log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn alert_count(&self) -> usize {
        self.alert_log
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Drop all timelines and logged alerts. Reset/test paths only.
    pub fn clear(&self) {
        self.timelines.clear();
        self.alert_log
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

/// The store is the default sink: dispatching appends to the alert log and
/// announces the alert on the tracing output.
#[async_trait]
impl AlertSink for PatientStore {
    async fn dispatch(&self, alert: &DispatchedAlert) -> Result<(), SinkError> {
        let event = &alert.event;
        tracing::info!(
            patient_id = %event.patient_id,
            condition = %event.condition,
            priority = ?alert.priority,
            timestamp_ms = event.timestamp_ms,
            "Alert dispatched"
        );
        self.append_alert(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "alert-log"
    }
}

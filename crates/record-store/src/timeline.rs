use std::collections::BTreeMap;
use std::ops::Bound;
use vitals_core::{Measurement, SignalType};

/// Result of writing a measurement into a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// All readings for one patient, keyed by `(timestamp, signal)`.
///
/// Recognised signal labels are normalised before keying, so `sp02` and
/// `SpO2` at the same instant address the same reading.
#[derive(Debug, Clone)]
pub struct PatientTimeline {
    patient_id: u32,
    readings: BTreeMap<(i64, String), Measurement>,
    /// Bumped on every insert and every replacement that changes a value
    revision: u64,
}

impl PatientTimeline {
    pub fn new(patient_id: u32) -> Self {
        Self {
            patient_id,
            readings: BTreeMap::new(),
            revision: 0,
        }
    }

    pub fn patient_id(&self) -> u32 {
        self.patient_id
    }

    pub fn upsert(&mut self, value: f64, signal: &str, timestamp_ms: i64) -> Upsert {
        let key = (timestamp_ms, identity_label(signal));
        match self.readings.get_mut(&key) {
            Some(existing) => {
                if existing.value != value {
                    existing.value = value;
                    self.revision += 1;
                }
                Upsert::Replaced
            }
            None => {
                self.readings.insert(
                    key,
                    Measurement::new(self.patient_id, value, signal, timestamp_ms),
                );
                self.revision += 1;
                Upsert::Inserted
            }
        }
    }

    /// Changes whenever the readings' content changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Readings inside `[start_ms, end_ms]` in ascending time order
    pub fn range(&self, start_ms: i64, end_ms: i64) -> Vec<Measurement> {
        if start_ms > end_ms {
            return vec![];
        }
        self.readings
            .range((Bound::Included((start_ms, String::new())), Bound::Unbounded))
            .take_while(|((ts, _), _)| *ts <= end_ms)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

fn identity_label(signal: &str) -> String {
    match SignalType::parse(signal) {
        Some(kind) => kind.label().to_string(),
        None => signal.to_string(),
    }
}

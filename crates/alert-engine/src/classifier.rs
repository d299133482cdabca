use std::collections::BTreeMap;
use vitals_core::{Measurement, SignalType};

/// A classified reading. The signal type is implied by the sequence it sits in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub timestamp_ms: i64,
}

impl Reading {
    pub fn new(value: f64, timestamp_ms: i64) -> Self {
        Self { value, timestamp_ms }
    }
}

/// One ascending-by-time sequence per recognised signal type
#[derive(Debug, Clone, Default)]
pub struct ClassifiedSignals {
    sequences: BTreeMap<SignalType, Vec<Reading>>,
}

impl ClassifiedSignals {
    /// Sequence for `signal`, empty if the patient has none
    pub fn get(&self, signal: SignalType) -> &[Reading] {
        self.sequences.get(&signal).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_readings(&self) -> usize {
        self.sequences.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_readings() == 0
    }
}

/// Split a patient's measurements into per-type sequences sorted by
/// timestamp. The sort is stable, so equal timestamps keep input order.
/// Unrecognised signal labels are dropped.
pub fn classify(measurements: &[Measurement]) -> ClassifiedSignals {
    let mut sequences: BTreeMap<SignalType, Vec<Reading>> =
        SignalType::ALL.iter().map(|s| (*s, Vec::new())).collect();

    for m in measurements {
        if let Some(signal) = m.signal_type() {
            if let Some(seq) = sequences.get_mut(&signal) {
                seq.push(Reading::new(m.value, m.timestamp_ms));
            }
        }
    }

    for seq in sequences.values_mut() {
        seq.sort_by_key(|r| r.timestamp_ms);
    }

    ClassifiedSignals { sequences }
}

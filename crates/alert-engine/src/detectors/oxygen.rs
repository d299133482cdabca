use super::{AlertKind, DetectorConfig, RawTrigger};
use crate::classifier::{ClassifiedSignals, Reading};
use vitals_core::SignalType;

pub fn low_saturation(signals: &ClassifiedSignals, config: &DetectorConfig) -> Vec<RawTrigger> {
    below_threshold(signals.get(SignalType::OxygenSaturation), config.spo2_low)
}

pub fn rapid_drop(signals: &ClassifiedSignals, config: &DetectorConfig) -> Vec<RawTrigger> {
    windowed_drops(
        signals.get(SignalType::OxygenSaturation),
        config.spo2_drop,
        config.spo2_drop_window_ms,
    )
}

/// Every reading strictly below `threshold`, whatever the sequence length
pub fn below_threshold(readings: &[Reading], threshold: f64) -> Vec<RawTrigger> {
    readings
        .iter()
        .filter(|r| r.value < threshold)
        .map(|r| RawTrigger::new(AlertKind::LowSpO2, r.timestamp_ms))
        .collect()
}

/// Pairs `(i, j)`, `j` later than `i` by at most `window_ms`, where the value
/// fell by `min_drop` or more. Relies on `readings` being time-sorted: the
/// inner scan stops at the first reading outside the window. A negative
/// window admits no pair.
pub fn windowed_drops(readings: &[Reading], min_drop: f64, window_ms: i64) -> Vec<RawTrigger> {
    let Ok(window) = u64::try_from(window_ms) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (i, earlier) in readings.iter().enumerate() {
        for later in &readings[i + 1..] {
            if later.timestamp_ms.abs_diff(earlier.timestamp_ms) > window {
                break;
            }
            if earlier.value - later.value >= min_drop {
                out.push(RawTrigger::new(AlertKind::RapidSpO2Drop, later.timestamp_ms));
            }
        }
    }
    out
}

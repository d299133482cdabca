use super::{AlertKind, DetectorConfig, RawTrigger};
use crate::classifier::{ClassifiedSignals, Reading};
use vitals_core::SignalType;

pub fn abnormal_peaks(signals: &ClassifiedSignals, config: &DetectorConfig) -> Vec<RawTrigger> {
    rolling_peaks(signals.get(SignalType::Ecg), config.ecg_window, config.ecg_peak_factor)
}

/// Flags each reading (from index `window` on) whose value exceeds `factor`
/// times the mean of the `window` readings before it. The trigger carries
/// the flagged reading's own timestamp.
pub fn rolling_peaks(readings: &[Reading], window: usize, factor: f64) -> Vec<RawTrigger> {
    if window == 0 || readings.len() <= window {
        return vec![];
    }

    (window..readings.len())
        .filter(|&i| {
            let mean = trailing_mean(&readings[i - window..i]);
            readings[i].value > mean * factor
        })
        .map(|i| RawTrigger::new(AlertKind::AbnormalEcgPeak, readings[i].timestamp_ms))
        .collect()
}

fn trailing_mean(window: &[Reading]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|r| r.value).sum::<f64>() / window.len() as f64
}

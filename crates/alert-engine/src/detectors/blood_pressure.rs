use super::{AlertKind, BoundaryPolicy, Bounds, DetectorConfig, RawTrigger};
use crate::classifier::{ClassifiedSignals, Reading};
use vitals_core::SignalType;

pub fn critical_systolic(signals: &ClassifiedSignals, config: &DetectorConfig) -> Vec<RawTrigger> {
    critical_thresholds(
        signals.get(SignalType::Systolic),
        config.systolic_bounds,
        config.boundary,
        AlertKind::CriticalSystolic,
    )
}

pub fn critical_diastolic(signals: &ClassifiedSignals, config: &DetectorConfig) -> Vec<RawTrigger> {
    critical_thresholds(
        signals.get(SignalType::Diastolic),
        config.diastolic_bounds,
        config.boundary,
        AlertKind::CriticalDiastolic,
    )
}

pub fn systolic_trend(signals: &ClassifiedSignals, config: &DetectorConfig) -> Vec<RawTrigger> {
    trends(signals.get(SignalType::Systolic), config.trend_delta, AlertKind::SystolicTrend)
}

pub fn diastolic_trend(signals: &ClassifiedSignals, config: &DetectorConfig) -> Vec<RawTrigger> {
    trends(signals.get(SignalType::Diastolic), config.trend_delta, AlertKind::DiastolicTrend)
}

pub fn hypotensive_hypoxemia(signals: &ClassifiedSignals, config: &DetectorConfig) -> Vec<RawTrigger> {
    correlate_hypotension(
        signals.get(SignalType::Systolic),
        signals.get(SignalType::OxygenSaturation),
        config,
    )
}

/// One trigger per reading outside `bounds`, in sequence order
pub fn critical_thresholds(
    readings: &[Reading],
    bounds: Bounds,
    policy: BoundaryPolicy,
    kind: AlertKind,
) -> Vec<RawTrigger> {
    readings
        .iter()
        .filter(|r| bounds.is_violated(r.value, policy))
        .map(|r| RawTrigger::new(kind, r.timestamp_ms))
        .collect()
}

/// Every consecutive triple whose two steps both exceed `delta` in the same
/// direction. Overlapping triples are tested independently, so a long
/// monotonic run raises one trigger per qualifying triple.
pub fn trends(readings: &[Reading], delta: f64, kind: AlertKind) -> Vec<RawTrigger> {
    readings
        .windows(3)
        .filter(|w| {
            let (v1, v2, v3) = (w[0].value, w[1].value, w[2].value);
            let rising = v2 - v1 > delta && v3 - v2 > delta;
            let falling = v1 - v2 > delta && v2 - v3 > delta;
            rising || falling
        })
        .map(|w| RawTrigger::new(kind, w[2].timestamp_ms))
        .collect()
}

/// Low systolic pressure paired with low saturation within the correlation
/// window. Every pair is considered; the trigger carries the later timestamp.
pub fn correlate_hypotension(
    systolic: &[Reading],
    spo2: &[Reading],
    config: &DetectorConfig,
) -> Vec<RawTrigger> {
    let mut out = Vec::new();
    for s in systolic.iter().filter(|s| s.value < config.hypotension_systolic) {
        for o in spo2 {
            let within = u64::try_from(config.correlation_window_ms)
                .is_ok_and(|window| s.timestamp_ms.abs_diff(o.timestamp_ms) <= window);
            if within && o.value < config.hypoxemia_spo2 {
                out.push(RawTrigger::new(
                    AlertKind::HypotensiveHypoxemia,
                    s.timestamp_ms.max(o.timestamp_ms),
                ));
            }
        }
    }
    out
}

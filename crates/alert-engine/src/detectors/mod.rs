//! Per-signal detectors.
//!
//! Every detector is a plain function of the classified sequences and the
//! detector configuration. They share no state, so the registry can run them
//! in any order and each detector's output is unaffected.

pub mod blood_pressure;
pub mod ecg;
pub mod oxygen;

use crate::classifier::ClassifiedSignals;
use serde::{Deserialize, Serialize};
use vitals_core::SignalFamily;

/// Everything the detectors can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    CriticalSystolic,
    CriticalDiastolic,
    SystolicTrend,
    DiastolicTrend,
    HypotensiveHypoxemia,
    #[serde(rename = "low_spo2")]
    LowSpO2,
    #[serde(rename = "rapid_spo2_drop")]
    RapidSpO2Drop,
    AbnormalEcgPeak,
}

impl AlertKind {
    pub const ALL: [AlertKind; 8] = [
        AlertKind::CriticalSystolic,
        AlertKind::CriticalDiastolic,
        AlertKind::SystolicTrend,
        AlertKind::DiastolicTrend,
        AlertKind::HypotensiveHypoxemia,
        AlertKind::LowSpO2,
        AlertKind::RapidSpO2Drop,
        AlertKind::AbnormalEcgPeak,
    ];

    /// Human-readable condition, before any family or priority prefix
    pub fn condition(&self) -> &'static str {
        match self {
            AlertKind::CriticalSystolic => "Critical Systolic BP",
            AlertKind::CriticalDiastolic => "Critical Diastolic BP",
            AlertKind::SystolicTrend => "Systolic Trend Alert",
            AlertKind::DiastolicTrend => "Diastolic Trend Alert",
            AlertKind::HypotensiveHypoxemia => "Hypotensive Hypoxemia",
            AlertKind::LowSpO2 => "Low SpO2",
            AlertKind::RapidSpO2Drop => "Rapid SpO2 Drop",
            AlertKind::AbnormalEcgPeak => "Abnormal ECG Peak",
        }
    }

    /// Family whose factory labels this alert
    pub fn family(&self) -> SignalFamily {
        match self {
            AlertKind::CriticalSystolic
            | AlertKind::CriticalDiastolic
            | AlertKind::SystolicTrend
            | AlertKind::DiastolicTrend
            | AlertKind::HypotensiveHypoxemia => SignalFamily::BloodPressure,
            AlertKind::LowSpO2 | AlertKind::RapidSpO2Drop => SignalFamily::BloodOxygen,
            AlertKind::AbnormalEcgPeak => SignalFamily::Ecg,
        }
    }
}

/// Unlabelled detector output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawTrigger {
    pub kind: AlertKind,
    pub timestamp_ms: i64,
}

impl RawTrigger {
    pub fn new(kind: AlertKind, timestamp_ms: i64) -> Self {
        Self { kind, timestamp_ms }
    }

    pub fn condition(&self) -> &'static str {
        self.kind.condition()
    }
}

/// How a reading sitting exactly on a critical bound is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// `value >= high || value <= low`
    #[default]
    Inclusive,
    /// `value > high || value < low`
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub low: f64,
    pub high: f64,
}

impl Bounds {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn is_violated(&self, value: f64, policy: BoundaryPolicy) -> bool {
        match policy {
            BoundaryPolicy::Inclusive => value >= self.high || value <= self.low,
            BoundaryPolicy::Strict => value > self.high || value < self.low,
        }
    }
}

/// Numeric parameters for every detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub systolic_bounds: Bounds,
    pub diastolic_bounds: Bounds,
    pub boundary: BoundaryPolicy,
    /// Minimum step between consecutive readings for a trend
    pub trend_delta: f64,
    pub spo2_low: f64,
    pub spo2_drop: f64,
    pub spo2_drop_window_ms: i64,
    pub hypotension_systolic: f64,
    pub hypoxemia_spo2: f64,
    pub correlation_window_ms: i64,
    pub ecg_window: usize,
    pub ecg_peak_factor: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            systolic_bounds: Bounds::new(90.0, 180.0),
            diastolic_bounds: Bounds::new(60.0, 120.0),
            boundary: BoundaryPolicy::Inclusive,
            trend_delta: 10.0,
            spo2_low: 92.0,
            spo2_drop: 5.0,
            spo2_drop_window_ms: 600_000,
            hypotension_systolic: 90.0,
            hypoxemia_spo2: 92.0,
            correlation_window_ms: 300_000,
            ecg_window: 5,
            ecg_peak_factor: 1.5,
        }
    }
}

pub type DetectFn = fn(&ClassifiedSignals, &DetectorConfig) -> Vec<RawTrigger>;

/// Registry entry
#[derive(Clone, Copy)]
pub struct Detector {
    pub name: &'static str,
    pub run: DetectFn,
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector").field("name", &self.name).finish()
    }
}

pub static DETECTORS: &[Detector] = &[
    Detector { name: "critical_systolic", run: blood_pressure::critical_systolic },
    Detector { name: "critical_diastolic", run: blood_pressure::critical_diastolic },
    Detector { name: "systolic_trend", run: blood_pressure::systolic_trend },
    Detector { name: "diastolic_trend", run: blood_pressure::diastolic_trend },
    Detector { name: "hypotensive_hypoxemia", run: blood_pressure::hypotensive_hypoxemia },
    Detector { name: "low_spo2", run: oxygen::low_saturation },
    Detector { name: "rapid_spo2_drop", run: oxygen::rapid_drop },
    Detector { name: "abnormal_ecg_peak", run: ecg::abnormal_peaks },
];

/// Run every registered detector
pub fn detect_all(signals: &ClassifiedSignals, config: &DetectorConfig) -> Vec<RawTrigger> {
    detect_with(DETECTORS, signals, config)
}

/// Run an explicit detector list, concatenating outputs in list order
pub fn detect_with(
    detectors: &[Detector],
    signals: &ClassifiedSignals,
    config: &DetectorConfig,
) -> Vec<RawTrigger> {
    detectors
        .iter()
        .flat_map(|d| {
            let triggers = (d.run)(signals, config);
            if !triggers.is_empty() {
                tracing::debug!(detector = d.name, count = triggers.len(), "Detector fired");
            }
            triggers
        })
        .collect()
}

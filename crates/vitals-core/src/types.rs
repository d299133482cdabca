use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single physiological reading as delivered by ingestion.
///
/// `signal` keeps the raw label so readings of types the engine does not
/// recognise are still stored, they are just never classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub patient_id: u32,
    pub value: f64,
    pub signal: String,
    pub timestamp_ms: i64,
}

impl Measurement {
    pub fn new(patient_id: u32, value: f64, signal: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            patient_id,
            value,
            signal: signal.into(),
            timestamp_ms,
        }
    }

    /// Parsed signal type, `None` for labels the engine ignores.
    pub fn signal_type(&self) -> Option<SignalType> {
        SignalType::parse(&self.signal)
    }
}

/// Signal types the detectors understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalType {
    Systolic,
    Diastolic,
    OxygenSaturation,
    Ecg,
}

impl SignalType {
    pub const ALL: [SignalType; 4] = [
        SignalType::Systolic,
        SignalType::Diastolic,
        SignalType::OxygenSaturation,
        SignalType::Ecg,
    ];

    /// Case-insensitive parse of the labels emitted by bedside feeds and
    /// the data generators. Unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "systolic" | "systolicpressure" => Some(SignalType::Systolic),
            "diastolic" | "diastolicpressure" => Some(SignalType::Diastolic),
            "spo2" | "sp02" | "saturation" => Some(SignalType::OxygenSaturation),
            "ecg" => Some(SignalType::Ecg),
            _ => None,
        }
    }

    /// Canonical label used when writing measurements back out
    pub fn label(&self) -> &'static str {
        match self {
            SignalType::Systolic => "Systolic",
            SignalType::Diastolic => "Diastolic",
            SignalType::OxygenSaturation => "SpO2",
            SignalType::Ecg => "ECG",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Signal family an alert is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalFamily {
    BloodPressure,
    BloodOxygen,
    Ecg,
}

impl SignalFamily {
    pub fn name(&self) -> &'static str {
        match self {
            SignalFamily::BloodPressure => "BloodPressure",
            SignalFamily::BloodOxygen => "BloodOxygen",
            SignalFamily::Ecg => "ECG",
        }
    }

    /// Prefix prepended to every condition raised for this family
    pub fn prefix(&self) -> String {
        format!("{} - ", self.name())
    }
}

/// Alert priority, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }

    /// Case-insensitive parse of the upper-case name
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Priority::Low),
            "MEDIUM" => Some(Priority::Medium),
            "HIGH" => Some(Priority::High),
            "CRITICAL" => Some(Priority::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert as seen by the sink. Immutable once built; decoration only
/// ever extends `condition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub patient_id: String,
    pub condition: String,
    /// Timestamp of the triggering measurement, not of evaluation
    pub timestamp_ms: i64,
}

impl AlertEvent {
    pub fn new(patient_id: impl Into<String>, condition: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            patient_id: patient_id.into(),
            condition: condition.into(),
            timestamp_ms,
        }
    }

    /// Triggering time as a UTC datetime, `None` if out of chrono's range
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms).single()
    }
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Alert[patient={}, condition={}, time={}]",
            self.patient_id, self.condition, self.timestamp_ms
        )
    }
}

/// What a sink receives: the rendered alert and the priority it was raised
/// with. Sinks branch on `priority`, never on the condition text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchedAlert {
    pub event: AlertEvent,
    /// `None` for alerts dispatched without a priority layer
    pub priority: Option<Priority>,
}

impl DispatchedAlert {
    pub fn new(event: AlertEvent, priority: Option<Priority>) -> Self {
        Self { event, priority }
    }

    pub fn with_priority(event: AlertEvent, priority: Priority) -> Self {
        Self::new(event, Some(priority))
    }
}

impl From<AlertEvent> for DispatchedAlert {
    fn from(event: AlertEvent) -> Self {
        Self::new(event, None)
    }
}

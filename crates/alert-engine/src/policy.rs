use crate::detectors::AlertKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use vitals_core::Priority;

/// Dispatch policy applied to every alert of one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    pub priority: Priority,
    /// Number of sink deliveries
    pub repeats: u32,
    /// Wait between consecutive deliveries
    pub interval_ms: u64,
}

impl AlertPolicy {
    pub const fn new(priority: Priority, repeats: u32, interval_ms: u64) -> Self {
        Self {
            priority,
            repeats,
            interval_ms,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Built-in policy for `kind`
    pub fn default_for(kind: AlertKind) -> Self {
        match kind {
            AlertKind::CriticalSystolic | AlertKind::CriticalDiastolic => {
                Self::new(Priority::High, 2, 30_000)
            }
            AlertKind::SystolicTrend | AlertKind::DiastolicTrend => {
                Self::new(Priority::Medium, 2, 30_000)
            }
            AlertKind::HypotensiveHypoxemia => Self::new(Priority::Critical, 8, 20_000),
            AlertKind::LowSpO2 => Self::new(Priority::High, 1, 0),
            AlertKind::RapidSpO2Drop => Self::new(Priority::Critical, 5, 20_000),
            AlertKind::AbnormalEcgPeak => Self::new(Priority::Medium, 3, 15_000),
        }
    }
}

/// Policy lookup by alert kind. Kinds without an explicit entry fall back to
/// the built-in policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyTable {
    overrides: HashMap<AlertKind, AlertPolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `{ "<alert_kind>": { priority, repeats, interval_ms } }`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_policy(mut self, kind: AlertKind, policy: AlertPolicy) -> Self {
        self.overrides.insert(kind, policy);
        self
    }

    pub fn get(&self, kind: AlertKind) -> AlertPolicy {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| AlertPolicy::default_for(kind))
    }

    /// Same table with every interval set to `interval_ms`. Used for batch
    /// runs where waiting between repeats only slows the replay.
    pub fn with_interval(&self, interval_ms: u64) -> Self {
        let overrides = AlertKind::ALL
            .iter()
            .map(|kind| {
                let mut policy = self.get(*kind);
                policy.interval_ms = interval_ms;
                (*kind, policy)
            })
            .collect();
        Self { overrides }
    }
}

use alert_engine::PolicyTable;
use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// CSV / JSON-lines feeds, re-read on every sweep
    pub measurement_files: Vec<PathBuf>,
    /// Live WebSocket feed, streamed into the store between sweeps
    pub measurement_ws_url: Option<String>,
    pub stream_reconnect_seconds: u64,
    pub sweep_interval_seconds: u64,
    /// Optional JSON overrides for the alert policy table
    pub alert_policy_file: Option<PathBuf>,
    pub max_concurrent_patients: usize,
    /// Evaluate once and exit
    pub single_sweep: bool,
    pub metrics_log_interval_sweeps: u64,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Missing keys take their defaults.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let measurement_files = var("MEASUREMENT_FILES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();

        let config = Self {
            measurement_files,
            measurement_ws_url: var("MEASUREMENT_WS_URL").filter(|s| !s.trim().is_empty()),
            stream_reconnect_seconds: var("STREAM_RECONNECT_SECONDS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .context("STREAM_RECONNECT_SECONDS must be a whole number of seconds")?,
            sweep_interval_seconds: var("SWEEP_INTERVAL_SECONDS")
                .unwrap_or_else(|| "60".to_string())
                .parse()
                .context("SWEEP_INTERVAL_SECONDS must be a whole number of seconds")?,
            alert_policy_file: var("ALERT_POLICY_FILE")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            max_concurrent_patients: var("MAX_CONCURRENT_PATIENTS")
                .unwrap_or_else(|| "16".to_string())
                .parse()
                .context("MAX_CONCURRENT_PATIENTS must be a positive integer")?,
            single_sweep: var("SINGLE_SWEEP")
                .unwrap_or_else(|| "false".to_string())
                .parse()
                .context("SINGLE_SWEEP must be true or false")?,
            metrics_log_interval_sweeps: var("METRICS_LOG_INTERVAL_SWEEPS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .context("METRICS_LOG_INTERVAL_SWEEPS must be a whole number")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_seconds == 0 {
            bail!("SWEEP_INTERVAL_SECONDS must be greater than 0");
        }
        if self.max_concurrent_patients == 0 {
            bail!("MAX_CONCURRENT_PATIENTS must be greater than 0");
        }
        if let Some(url) = &self.measurement_ws_url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                bail!("MEASUREMENT_WS_URL must start with ws:// or wss://");
            }
        }
        Ok(())
    }

    /// Policy table with the file's overrides applied, or the built-in one
    pub fn load_policies(&self) -> Result<PolicyTable> {
        let Some(path) = &self.alert_policy_file else {
            return Ok(PolicyTable::default());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ALERT_POLICY_FILE {}", path.display()))?;
        PolicyTable::from_json(&json)
            .with_context(|| format!("Invalid alert policy file {}", path.display()))
    }
}

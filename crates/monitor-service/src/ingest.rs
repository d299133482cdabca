//! Measurement line parsing and file feeds.
//!
//! Two line formats are accepted and may be mixed in one feed:
//!
//! - CSV: `patientId,value,type,timestamp` in files, `patientId,timestamp,label,data`
//!   on the live stream (a header line is skipped)
//! - JSON: `{"patientId":..,"measurementValue":..,"recordType":..,"timestamp":..}`
//!
//! Values may carry units (`"95%"`); only the numeric part is kept. A bad
//! line is logged and skipped, it never aborts the feed.

use record_store::{PatientStore, Upsert};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use vitals_core::Measurement;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

impl IngestError {
    fn malformed(line: usize, reason: impl Into<String>) -> Self {
        IngestError::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

/// Per-feed ingestion counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub inserted: usize,
    pub replaced: usize,
    pub skipped: usize,
}

impl IngestStats {
    /// Store a parsed line and count the outcome
    pub fn apply(&mut self, store: &PatientStore, parsed: Result<Option<Measurement>, IngestError>) {
        match parsed {
            Ok(Some(measurement)) => match store.add(&measurement) {
                Upsert::Inserted => self.inserted += 1,
                Upsert::Replaced => self.replaced += 1,
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Skipping measurement: {}", e);
                self.skipped += 1;
            }
        }
    }
}

/// Field order of a CSV line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// `patientId,value,type,timestamp`
    File,
    /// `patientId,timestamp,label,data`; `Alert` rows are echoes and skipped
    Stream,
}

impl CsvLayout {
    /// Indices of (value, signal, timestamp); the patient id is always first
    fn columns(self) -> (usize, usize, usize) {
        match self {
            CsvLayout::File => (1, 2, 3),
            CsvLayout::Stream => (3, 2, 1),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonRecord {
    patient_id: Value,
    measurement_value: Value,
    record_type: String,
    timestamp: Value,
}

/// Numeric part of a value such as `"95%"` or `" 120 mmHg"`
pub fn clean_value(raw: &str) -> Option<f64> {
    let numeric: String = raw
        .trim()
        .chars()
        .skip_while(|c| !(c.is_ascii_digit() || *c == '-' || *c == '.'))
        .take_while(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect();
    numeric.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => clean_value(s),
        _ => None,
    }
}

fn whole<T: TryFrom<i64>>(value: f64) -> Option<T> {
    if value.fract() != 0.0 {
        return None;
    }
    T::try_from(value as i64).ok()
}

fn build(
    line: usize,
    patient: Option<f64>,
    value: Option<f64>,
    signal: &str,
    timestamp: Option<f64>,
) -> Result<Measurement, IngestError> {
    let patient_id: u32 = patient
        .and_then(whole)
        .ok_or_else(|| IngestError::malformed(line, "invalid patient id"))?;
    let value = value.ok_or_else(|| IngestError::malformed(line, "invalid measurement value"))?;
    let signal = signal.trim();
    if signal.is_empty() {
        return Err(IngestError::malformed(line, "missing record type"));
    }
    let timestamp_ms: i64 = timestamp
        .and_then(whole)
        .ok_or_else(|| IngestError::malformed(line, "invalid timestamp"))?;
    Ok(Measurement::new(patient_id, value, signal, timestamp_ms))
}

/// Parse one file line. Blank lines, `#` comments and CSV headers yield
/// `Ok(None)`.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Measurement>, IngestError> {
    parse_with(line_no, line, CsvLayout::File)
}

pub fn parse_with(line_no: usize, line: &str, layout: CsvLayout) -> Result<Option<Measurement>, IngestError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if line.starts_with('{') {
        let record: JsonRecord = serde_json::from_str(line)
            .map_err(|e| IngestError::malformed(line_no, e.to_string()))?;
        return build(
            line_no,
            number(&record.patient_id),
            number(&record.measurement_value),
            &record.record_type,
            number(&record.timestamp),
        )
        .map(Some);
    }

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 4 {
        return Err(IngestError::malformed(
            line_no,
            format!("expected 4 fields, found {}", fields.len()),
        ));
    }
    if fields[0].eq_ignore_ascii_case("patientId") {
        return Ok(None);
    }
    let (value, signal, timestamp) = layout.columns();
    if layout == CsvLayout::Stream && fields[signal].eq_ignore_ascii_case("Alert") {
        return Ok(None);
    }
    build(
        line_no,
        fields[0].parse().ok(),
        clean_value(fields[value]),
        fields[signal],
        fields[timestamp].parse().ok(),
    )
    .map(Some)
}

/// Ingest every line of `content` into the store
pub fn ingest_str(content: &str, store: &PatientStore) -> IngestStats {
    let mut stats = IngestStats::default();
    for (idx, line) in content.lines().enumerate() {
        stats.apply(store, parse_line(idx + 1, line));
    }
    stats
}

pub async fn ingest_file(path: &Path, store: &PatientStore) -> Result<IngestStats, IngestError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let stats = ingest_str(&content, store);
    tracing::info!(
        file = %path.display(),
        inserted = stats.inserted,
        replaced = stats.replaced,
        skipped = stats.skipped,
        "Ingested measurement file"
    );
    Ok(stats)
}

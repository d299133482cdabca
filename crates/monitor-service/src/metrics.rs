use alert_engine::EvaluationSummary;
use std::time::Instant;

/// Running totals across sweeps, logged through tracing.
pub struct SweepMetrics {
    pub sweeps_run: u64,
    pub patients_evaluated: u64,
    pub alerts_raised: u64,
    pub deliveries: u64,
    pub delivery_failures: u64,
    /// Patients whose repetitions were cut short by shutdown
    pub cancelled_patients: u64,
    pub measurements_ingested: u64,
    pub lines_skipped: u64,

    pub last_sweep_duration_ms: u64,
    log_interval_sweeps: u64,
}

impl SweepMetrics {
    pub fn new(log_interval_sweeps: u64) -> Self {
        Self {
            sweeps_run: 0,
            patients_evaluated: 0,
            alerts_raised: 0,
            deliveries: 0,
            delivery_failures: 0,
            cancelled_patients: 0,
            measurements_ingested: 0,
            lines_skipped: 0,
            last_sweep_duration_ms: 0,
            log_interval_sweeps,
        }
    }

    pub fn start_timer() -> Instant {
        Instant::now()
    }

    /// `inserted` counts new readings only; re-read lines are replaced in place
    pub fn record_ingest(&mut self, inserted: usize, skipped: usize) {
        self.measurements_ingested += inserted as u64;
        self.lines_skipped += skipped as u64;
    }

    pub fn record_patient(&mut self, summary: &EvaluationSummary) {
        self.patients_evaluated += 1;
        self.alerts_raised += summary.alerts as u64;
        self.deliveries += u64::from(summary.delivered);
        self.delivery_failures += summary.failures.len() as u64;
        if summary.cancelled {
            self.cancelled_patients += 1;
        }
    }

    pub fn finish_sweep(&mut self, sweep_start: Instant) {
        self.last_sweep_duration_ms = sweep_start.elapsed().as_millis() as u64;
        self.sweeps_run += 1;

        if self.log_interval_sweeps > 0 && self.sweeps_run % self.log_interval_sweeps == 0 {
            self.log_metrics();
        }
    }

    /// Share of dispatch attempts that reached every sink (0-100%)
    pub fn delivery_rate(&self) -> f64 {
        let attempts = self.deliveries + self.delivery_failures;
        if attempts == 0 {
            return 100.0;
        }
        (self.deliveries as f64 / attempts as f64) * 100.0
    }

    pub fn log_metrics(&self) {
        tracing::info!(
            sweeps = self.sweeps_run,
            patients_evaluated = self.patients_evaluated,
            alerts_raised = self.alerts_raised,
            deliveries = self.deliveries,
            delivery_failures = self.delivery_failures,
            delivery_rate = format!("{:.1}%", self.delivery_rate()),
            cancelled_patients = self.cancelled_patients,
            measurements_ingested = self.measurements_ingested,
            lines_skipped = self.lines_skipped,
            last_sweep_ms = self.last_sweep_duration_ms,
            "Monitor metrics summary"
        );
    }
}

use thiserror::Error;

/// Failure reported by an alert sink for a single dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Alert rejected: {0}")]
    Rejected(String),

    #[error("Notification failed: {0}")]
    Notification(String),
}

/// Error surfaced to callers that want a dispatch to be all-or-nothing.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{failed} of {attempts} dispatch attempts failed for patient {patient_id}: {first}")]
    Sink {
        patient_id: String,
        attempts: u32,
        failed: usize,
        first: SinkError,
    },
}

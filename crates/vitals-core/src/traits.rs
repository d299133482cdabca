use async_trait::async_trait;
use crate::{DispatchedAlert, SinkError};

/// Terminal delivery point for dispatched alerts (alert log, notifiers).
///
/// Called once per dispatch step. Implementations must not panic on
/// well-formed events; failures come back as `SinkError`.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn dispatch(&self, alert: &DispatchedAlert) -> Result<(), SinkError>;
    fn name(&self) -> &str;
}

use crate::ingest::{parse_with, CsvLayout, IngestStats};
use alert_engine::ShutdownSignal;
use futures_util::{SinkExt, StreamExt};
use record_store::PatientStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Live measurement feed over a WebSocket.
///
/// Every text frame may hold one or more lines, each either JSON or CSV in
/// `patientId,timestamp,label,data` order. Parsed readings go straight into
/// the store; the periodic sweep picks them up by revision.
pub struct MeasurementStream {
    url: String,
    store: Arc<PatientStore>,
    reconnect_delay: Duration,
}

impl MeasurementStream {
    pub fn new(url: impl Into<String>, store: Arc<PatientStore>) -> Self {
        Self {
            url: url.into(),
            store,
            reconnect_delay: Duration::from_secs(5),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Stream until the server closes the connection or shutdown fires.
    /// Connection errors are retried after the reconnect delay.
    pub async fn run(&self, shutdown: ShutdownSignal) -> IngestStats {
        let mut stats = IngestStats::default();
        let mut lines = 0;
        loop {
            match self.connect_and_stream(&shutdown, &mut stats, &mut lines).await {
                Ok(()) => {
                    tracing::info!("Measurement stream disconnected gracefully");
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        "Measurement stream error: {}, reconnecting in {}s",
                        e,
                        self.reconnect_delay.as_secs_f64()
                    );
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => {
                            tracing::info!("Measurement stream shutdown requested");
                            break;
                        }
                        _ = tokio::time::sleep(self.reconnect_delay) => {}
                    }
                }
            }
        }
        tracing::info!(
            inserted = stats.inserted,
            replaced = stats.replaced,
            skipped = stats.skipped,
            "Measurement stream stopped"
        );
        stats
    }

    async fn connect_and_stream(
        &self,
        shutdown: &ShutdownSignal,
        stats: &mut IngestStats,
        lines: &mut usize,
    ) -> Result<(), tokio_tungstenite::tungstenite::Error> {
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();
        tracing::info!(url = %self.url, "Connected to measurement stream");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_message(&text, stats, lines);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!("Measurement stream closed by server");
                            return Ok(());
                        }
                        Some(Err(e)) => return Err(e),
                        _ => {}
                    }
                }
            }
        }
    }

    fn handle_message(&self, text: &str, stats: &mut IngestStats, lines: &mut usize) {
        for line in text.lines() {
            *lines += 1;
            stats.apply(&self.store, parse_with(*lines, line, CsvLayout::Stream));
        }
    }
}

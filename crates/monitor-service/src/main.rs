use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alert_engine::{shutdown_channel, AlertEvaluator, ShutdownHandle, ShutdownSignal};
use anyhow::Result;
use notification_service::{NotificationConfig, NotificationService};
use record_store::PatientStore;
use tokio::signal::unix::SignalKind;
use tokio::sync::Semaphore;
use tokio::time::{self, MissedTickBehavior};
use vitals_core::AlertSink;

mod config;
mod dispatcher;
mod ingest;
mod metrics;
mod stream;
mod sweep;

use config::MonitorConfig;
use dispatcher::AlertDispatcher;
use metrics::SweepMetrics;
use stream::MeasurementStream;
use sweep::{run_sweep, SweepTracker};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Panic hook: log panic info before crashing
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("Starting VitalWatch monitor service");

    // 2. Load configuration
    let config = MonitorConfig::from_env()?;
    let policies = config.load_policies()?;
    tracing::info!("Configuration loaded and validated");
    tracing::info!("  Measurement files: {}", config.measurement_files.len());
    if let Some(url) = &config.measurement_ws_url {
        tracing::info!("  Measurement stream: {}", url);
    }
    tracing::info!("  Sweep interval: {} seconds", config.sweep_interval_seconds);
    tracing::info!("  Max concurrent patients: {}", config.max_concurrent_patients);
    if let Some(path) = &config.alert_policy_file {
        tracing::info!("  Alert policy overrides: {}", path.display());
    }

    // 3. Store, evaluator and sinks
    let store = Arc::new(PatientStore::new());
    let evaluator = Arc::new(AlertEvaluator::new(Arc::clone(&store)).with_policies(policies));

    let notifications = NotificationService::new(&NotificationConfig::from_env());
    let dispatcher = AlertDispatcher::new(Arc::clone(&store)).with_notifications(notifications);
    if !dispatcher.notifies() {
        tracing::info!("Alerts will be written to the alert log only");
    }
    let sink: Arc<dyn AlertSink> = Arc::new(dispatcher);

    let limit = Arc::new(Semaphore::new(config.max_concurrent_patients));
    let mut metrics = SweepMetrics::new(config.metrics_log_interval_sweeps);
    let mut tracker = SweepTracker::new();

    // 4. Shutdown on SIGINT + SIGTERM
    let (shutdown_handle, shutdown) = shutdown_channel();
    listen_for_shutdown(shutdown_handle)?;

    if config.single_sweep {
        if config.measurement_ws_url.is_some() {
            tracing::info!("Measurement stream is not read in single-sweep mode");
        }
        ingest_all(&config.measurement_files, &store, &mut metrics).await;
        sweep_once(&evaluator, &store, &sink, &limit, &shutdown, &mut tracker, &mut metrics).await;
        metrics.log_metrics();
        tracing::info!(alerts_logged = store.alert_count(), "Single sweep complete");
        return Ok(());
    }

    let stream_task = config.measurement_ws_url.as_ref().map(|url| {
        let stream = MeasurementStream::new(url.clone(), Arc::clone(&store))
            .with_reconnect_delay(Duration::from_secs(config.stream_reconnect_seconds));
        let shutdown = shutdown.clone();
        tokio::spawn(async move { stream.run(shutdown).await })
    });

    tracing::info!(
        "Monitor is now running. Sweeping every {}s. Press Ctrl+C to stop.",
        config.sweep_interval_seconds
    );

    // 5. Main loop. A sweep that outlasts the interval delays the next one
    // rather than stacking ticks.
    let mut interval = time::interval(Duration::from_secs(config.sweep_interval_seconds));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::info!("Shutdown signal received, exiting gracefully...");
                break;
            }
            _ = interval.tick() => {
                ingest_all(&config.measurement_files, &store, &mut metrics).await;
                sweep_once(&evaluator, &store, &sink, &limit, &shutdown, &mut tracker, &mut metrics).await;
            }
        }
    }

    if let Some(task) = stream_task {
        match task.await {
            Ok(stats) => metrics.record_ingest(stats.inserted, stats.skipped),
            Err(e) => tracing::error!("Measurement stream task failed: {}", e),
        }
    }

    metrics.log_metrics();
    tracing::info!(alerts_logged = store.alert_count(), "Monitor shut down.");
    Ok(())
}

fn listen_for_shutdown(handle: ShutdownHandle) -> Result<()> {
    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
        }
        handle.trigger();
    });
    Ok(())
}

/// Re-read every feed. Readings already stored are replaced in place, so
/// only appended lines and corrected values move a patient's revision.
async fn ingest_all(files: &[PathBuf], store: &PatientStore, metrics: &mut SweepMetrics) {
    for path in files {
        match ingest::ingest_file(path, store).await {
            Ok(stats) => metrics.record_ingest(stats.inserted, stats.skipped),
            Err(e) => tracing::warn!("Failed to ingest measurements: {}", e),
        }
    }
}

async fn sweep_once(
    evaluator: &Arc<AlertEvaluator>,
    store: &PatientStore,
    sink: &Arc<dyn AlertSink>,
    limit: &Arc<Semaphore>,
    shutdown: &ShutdownSignal,
    tracker: &mut SweepTracker,
    metrics: &mut SweepMetrics,
) {
    let sweep_start = SweepMetrics::start_timer();
    let patients = tracker.changed(store);
    if patients.is_empty() {
        tracing::debug!("No changed timelines since last sweep");
    } else {
        tracing::info!(patients = patients.len(), "Sweeping patients with changed timelines");
    }

    let summaries = run_sweep(
        Arc::clone(evaluator),
        patients,
        Arc::clone(sink),
        Arc::clone(limit),
        shutdown.clone(),
    )
    .await;

    for summary in &summaries {
        tracker.complete(summary.patient_id);
        metrics.record_patient(summary);
    }
    metrics.finish_sweep(sweep_start);
}

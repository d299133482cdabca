use alert_engine::{
    decorate, dispatch_all, AlertComponent, AlertEvaluator, AlertPolicy, PolicyTable,
    PriorityDecorator, RepetitionDecorator, ShutdownSignal,
};
use async_trait::async_trait;
use record_store::PatientStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vitals_core::{AlertEvent, AlertSink, DispatchedAlert, Priority, SinkError};

#[derive(Default)]
struct CollectingSink {
    received: Mutex<Vec<DispatchedAlert>>,
}

impl CollectingSink {
    fn received(&self) -> Vec<DispatchedAlert> {
        self.received.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<AlertEvent> {
        self.received().into_iter().map(|a| a.event).collect()
    }
}

#[async_trait]
impl AlertSink for CollectingSink {
    async fn dispatch(&self, alert: &DispatchedAlert) -> Result<(), SinkError> {
        self.received.lock().unwrap().push(alert.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "collecting"
    }
}

fn evaluator(patient_id: u32, readings: &[(f64, &str, i64)]) -> AlertEvaluator {
    let store = Arc::new(PatientStore::new());
    for &(value, signal, ts) in readings {
        store.add_measurement(patient_id, value, signal, ts);
    }
    AlertEvaluator::new(store).with_policies(PolicyTable::new().with_interval(0))
}

fn with_condition<'a>(alerts: &'a [AlertEvent], condition: &str) -> Vec<&'a AlertEvent> {
    alerts.iter().filter(|a| a.condition == condition).collect()
}

#[test]
fn critical_systolic_readings_raise_one_alert_each() {
    let alerts = evaluator(1, &[(190.0, "Systolic", 1_000), (80.0, "Systolic", 2_000)]).detect(1);

    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0], AlertEvent::new("1", "BloodPressure - Critical Systolic BP", 1_000));
    assert_eq!(alerts[1], AlertEvent::new("1", "BloodPressure - Critical Systolic BP", 2_000));
}

#[test]
fn rapid_spo2_drop_within_window() {
    let alerts = evaluator(2, &[(98.0, "SpO2", 1_000), (90.0, "SpO2", 2_000)]).detect(2);

    let drops = with_condition(&alerts, "BloodOxygen - Rapid SpO2 Drop");
    assert_eq!(drops.len(), 1);
    assert_eq!(drops[0].timestamp_ms, 2_000);

    // 90 is also below the saturation floor
    let low = with_condition(&alerts, "BloodOxygen - Low SpO2");
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].timestamp_ms, 2_000);
}

#[test]
fn rising_systolic_trend() {
    let alerts = evaluator(
        3,
        &[(100.0, "Systolic", 10), (115.0, "Systolic", 20), (130.0, "Systolic", 30)],
    )
    .detect(3);

    assert_eq!(alerts, vec![AlertEvent::new("3", "BloodPressure - Systolic Trend Alert", 30)]);
}

#[test]
fn hypotensive_hypoxemia_takes_later_timestamp() {
    let alerts = evaluator(4, &[(85.0, "Systolic", 1_000), (90.0, "SpO2", 1_200)]).detect(4);

    let combined = with_condition(&alerts, "BloodPressure - Hypotensive Hypoxemia");
    assert_eq!(combined.len(), 1);
    assert_eq!(combined[0].timestamp_ms, 1_200);
}

#[test]
fn ecg_peak_over_rolling_baseline() {
    let mut readings: Vec<(f64, &str, i64)> = (0..5).map(|i| (60.0, "ECG", i * 100)).collect();
    readings.push((200.0, "ECG", 500));
    let alerts = evaluator(5, &readings).detect(5);
    assert_eq!(alerts, vec![AlertEvent::new("5", "ECG - Abnormal ECG Peak", 500)]);

    let flat: Vec<(f64, &str, i64)> = (0..10)
        .map(|i| (if i % 2 == 0 { 10.0 } else { 11.0 }, "ECG", i * 100))
        .collect();
    assert!(evaluator(6, &flat).detect(6).is_empty());
}

#[test]
fn arrival_order_does_not_change_alerts() {
    let readings = [
        (130.0, "Systolic", 30),
        (100.0, "Systolic", 10),
        (115.0, "Systolic", 20),
        (90.0, "SpO2", 25),
        (98.0, "SpO2", 5),
    ];
    let mut reversed = readings;
    reversed.reverse();

    assert_eq!(evaluator(7, &readings).detect(7), evaluator(7, &reversed).detect(7));
}

#[tokio::test]
async fn critical_then_repeat_three_times() {
    let sink = CollectingSink::default();
    let base = AlertEvent::new("8", "BloodOxygen - Low SpO2", 4_000);
    let alert = RepetitionDecorator::new(
        PriorityDecorator::new(base.clone(), Priority::Critical),
        3,
        Duration::ZERO,
    );

    let report = alert.dispatch(&sink, &ShutdownSignal::never()).await;

    assert_eq!(report.attempts, 3);
    let events = sink.events();
    assert_eq!(events.len(), 3);
    let expected = format!("[CRITICAL] {}", base.condition);
    assert!(events.iter().all(|e| e.condition == expected));
}

#[tokio::test]
async fn evaluate_and_dispatch_applies_default_policies() {
    let evaluator = evaluator(9, &[(85.0, "Systolic", 1_000), (90.0, "SpO2", 1_200)]);
    let sink = CollectingSink::default();

    let summary = evaluator
        .evaluate_and_dispatch(9, &sink, &ShutdownSignal::never())
        .await;

    // Hypotensive hypoxemia CRITICAL x8, critical systolic HIGH x2, low SpO2 HIGH x1
    assert_eq!(summary.alerts, 3);
    assert_eq!(summary.delivered, 11);
    assert!(summary.failures.is_empty());

    let events = sink.events();
    assert!(events[..8]
        .iter()
        .all(|e| e.condition == "[CRITICAL] BloodPressure - Hypotensive Hypoxemia"));
    assert_eq!(events[8].condition, "[HIGH] BloodPressure - Critical Systolic BP");
    assert_eq!(events[10].condition, "[HIGH] BloodOxygen - Low SpO2");

    let priorities: Vec<Option<Priority>> = sink.received().iter().map(|a| a.priority).collect();
    assert!(priorities[..8].iter().all(|p| *p == Some(Priority::Critical)));
    assert!(priorities[8..].iter().all(|p| *p == Some(Priority::High)));
}

#[tokio::test]
async fn store_sink_records_every_delivery() {
    let store = Arc::new(PatientStore::new());
    let alerts = vec![
        decorate(AlertEvent::new("10", "ECG - Abnormal ECG Peak", 1), &AlertPolicy::new(Priority::Medium, 2, 0)),
        decorate(AlertEvent::new("10", "BloodPressure - Systolic Trend Alert", 2), &AlertPolicy::new(Priority::Low, 1, 0)),
    ];

    let summary = dispatch_all(10, &alerts, store.as_ref(), &ShutdownSignal::never()).await;

    assert_eq!(summary.delivered, 3);
    let log = store.alert_log();
    assert_eq!(log.len(), 3);
    assert_eq!(log[2].condition, "[LOW] BloodPressure - Systolic Trend Alert");
}

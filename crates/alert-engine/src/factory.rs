use vitals_core::{AlertEvent, SignalFamily};

/// Builds an alert labelled with its signal family
pub type AlertFactory = fn(&str, &str, i64) -> AlertEvent;

pub fn blood_pressure_alert(patient_id: &str, condition: &str, timestamp_ms: i64) -> AlertEvent {
    labelled(SignalFamily::BloodPressure, patient_id, condition, timestamp_ms)
}

pub fn blood_oxygen_alert(patient_id: &str, condition: &str, timestamp_ms: i64) -> AlertEvent {
    labelled(SignalFamily::BloodOxygen, patient_id, condition, timestamp_ms)
}

pub fn ecg_alert(patient_id: &str, condition: &str, timestamp_ms: i64) -> AlertEvent {
    labelled(SignalFamily::Ecg, patient_id, condition, timestamp_ms)
}

/// Factory lookup by family
pub fn factory_for(family: SignalFamily) -> AlertFactory {
    match family {
        SignalFamily::BloodPressure => blood_pressure_alert,
        SignalFamily::BloodOxygen => blood_oxygen_alert,
        SignalFamily::Ecg => ecg_alert,
    }
}

fn labelled(family: SignalFamily, patient_id: &str, condition: &str, timestamp_ms: i64) -> AlertEvent {
    AlertEvent::new(patient_id, format!("{}{}", family.prefix(), condition), timestamp_ms)
}

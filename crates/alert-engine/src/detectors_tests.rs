#[cfg(test)]
mod tests {
    use crate::classifier::{classify, ClassifiedSignals, Reading};
    use crate::detectors::blood_pressure::{correlate_hypotension, critical_thresholds, trends};
    use crate::detectors::ecg::rolling_peaks;
    use crate::detectors::oxygen::{below_threshold, windowed_drops};
    use crate::detectors::*;
    use vitals_core::Measurement;

    fn readings(points: &[(f64, i64)]) -> Vec<Reading> {
        points.iter().map(|&(v, t)| Reading::new(v, t)).collect()
    }

    fn signals(points: &[(f64, &str, i64)]) -> ClassifiedSignals {
        let measurements: Vec<Measurement> = points
            .iter()
            .map(|&(v, s, t)| Measurement::new(1, v, s, t))
            .collect();
        classify(&measurements)
    }

    fn timestamps(triggers: &[RawTrigger]) -> Vec<i64> {
        triggers.iter().map(|t| t.timestamp_ms).collect()
    }

    // Critical thresholds

    #[test]
    fn test_critical_systolic_high_and_low() {
        let s = signals(&[(190.0, "Systolic", 1), (80.0, "Systolic", 2), (120.0, "Systolic", 3)]);
        let out = blood_pressure::critical_systolic(&s, &DetectorConfig::default());
        assert_eq!(out.len(), 2);
        assert_eq!(timestamps(&out), vec![1, 2]);
        assert!(out.iter().all(|t| t.condition() == "Critical Systolic BP"));
    }

    #[test]
    fn test_inclusive_boundary_triggers_on_bound() {
        let bounds = Bounds::new(90.0, 180.0);
        let r = readings(&[(180.0, 1), (90.0, 2), (179.9, 3), (90.1, 4)]);
        let out = critical_thresholds(&r, bounds, BoundaryPolicy::Inclusive, AlertKind::CriticalSystolic);
        assert_eq!(timestamps(&out), vec![1, 2]);
    }

    #[test]
    fn test_strict_boundary_ignores_bound() {
        let bounds = Bounds::new(90.0, 180.0);
        let r = readings(&[(180.0, 1), (90.0, 2), (180.1, 3), (89.9, 4)]);
        let out = critical_thresholds(&r, bounds, BoundaryPolicy::Strict, AlertKind::CriticalSystolic);
        assert_eq!(timestamps(&out), vec![3, 4]);
    }

    #[test]
    fn test_critical_diastolic_bounds() {
        let s = signals(&[
            (120.0, "Diastolic", 1),
            (60.0, "Diastolic", 2),
            (80.0, "Diastolic", 3),
            (125.0, "Systolic", 4),
        ]);
        let out = blood_pressure::critical_diastolic(&s, &DetectorConfig::default());
        assert_eq!(timestamps(&out), vec![1, 2]);
        assert!(out.iter().all(|t| t.kind == AlertKind::CriticalDiastolic));
    }

    #[test]
    fn test_critical_output_is_time_ordered() {
        let s = signals(&[(200.0, "Systolic", 30), (50.0, "Systolic", 10), (195.0, "Systolic", 20)]);
        let out = blood_pressure::critical_systolic(&s, &DetectorConfig::default());
        assert_eq!(timestamps(&out), vec![10, 20, 30]);
    }

    // Trends

    #[test]
    fn test_rising_trend() {
        let s = signals(&[(100.0, "Systolic", 10), (115.0, "Systolic", 20), (130.0, "Systolic", 30)]);
        let out = blood_pressure::systolic_trend(&s, &DetectorConfig::default());
        assert_eq!(out, vec![RawTrigger::new(AlertKind::SystolicTrend, 30)]);
        assert_eq!(out[0].condition(), "Systolic Trend Alert");
    }

    #[test]
    fn test_falling_trend_diastolic() {
        let s = signals(&[(110.0, "Diastolic", 1), (95.0, "Diastolic", 2), (80.0, "Diastolic", 3)]);
        let out = blood_pressure::diastolic_trend(&s, &DetectorConfig::default());
        assert_eq!(out, vec![RawTrigger::new(AlertKind::DiastolicTrend, 3)]);
    }

    #[test]
    fn test_trend_requires_both_steps_over_delta() {
        // Second step is exactly 10: not a trend
        let r = readings(&[(100.0, 1), (115.0, 2), (125.0, 3)]);
        assert!(trends(&r, 10.0, AlertKind::SystolicTrend).is_empty());
        // Mixed direction
        let r = readings(&[(100.0, 1), (120.0, 2), (100.0, 3)]);
        assert!(trends(&r, 10.0, AlertKind::SystolicTrend).is_empty());
    }

    #[test]
    fn test_overlapping_trend_windows_each_fire() {
        let r = readings(&[(100.0, 1), (115.0, 2), (130.0, 3), (145.0, 4), (160.0, 5)]);
        let out = trends(&r, 10.0, AlertKind::SystolicTrend);
        assert_eq!(timestamps(&out), vec![3, 4, 5]);
    }

    #[test]
    fn test_trend_too_few_readings() {
        let r = readings(&[(100.0, 1), (150.0, 2)]);
        assert!(trends(&r, 10.0, AlertKind::SystolicTrend).is_empty());
        assert!(trends(&[], 10.0, AlertKind::SystolicTrend).is_empty());
    }

    // Oxygen saturation

    #[test]
    fn test_single_low_spo2() {
        let s = signals(&[(90.0, "SpO2", 5)]);
        let out = oxygen::low_saturation(&s, &DetectorConfig::default());
        assert_eq!(out, vec![RawTrigger::new(AlertKind::LowSpO2, 5)]);
    }

    #[test]
    fn test_low_spo2_fires_per_reading() {
        let r = readings(&[(91.0, 1), (95.0, 2), (88.0, 3), (92.0, 4)]);
        let out = below_threshold(&r, 92.0);
        assert_eq!(timestamps(&out), vec![1, 3]);
    }

    #[test]
    fn test_rapid_drop_within_window() {
        let s = signals(&[(98.0, "SpO2", 1_000), (90.0, "SpO2", 2_000)]);
        let out = oxygen::rapid_drop(&s, &DetectorConfig::default());
        assert_eq!(out, vec![RawTrigger::new(AlertKind::RapidSpO2Drop, 2_000)]);
        assert_eq!(out[0].condition(), "Rapid SpO2 Drop");
    }

    #[test]
    fn test_rapid_drop_outside_window() {
        let r = readings(&[(98.0, 0), (90.0, 600_001)]);
        assert!(windowed_drops(&r, 5.0, 600_000).is_empty());
        // Exactly on the window edge still counts
        let r = readings(&[(98.0, 0), (93.0, 600_000)]);
        assert_eq!(windowed_drops(&r, 5.0, 600_000).len(), 1);
    }

    #[test]
    fn test_rapid_drop_every_qualifying_pair() {
        let r = readings(&[(99.0, 0), (97.0, 1_000), (93.0, 2_000), (91.0, 3_000)]);
        // (99,93) (99,91) (97,91)
        let out = windowed_drops(&r, 5.0, 600_000);
        assert_eq!(timestamps(&out), vec![2_000, 3_000, 3_000]);
    }

    // Hypotensive hypoxemia

    #[test]
    fn test_hypotensive_hypoxemia_uses_later_timestamp() {
        let s = signals(&[(85.0, "Systolic", 1_000), (90.0, "sp02", 1_200)]);
        let out = blood_pressure::hypotensive_hypoxemia(&s, &DetectorConfig::default());
        assert_eq!(out, vec![RawTrigger::new(AlertKind::HypotensiveHypoxemia, 1_200)]);
    }

    #[test]
    fn test_hypotensive_hypoxemia_spo2_before_systolic() {
        let config = DetectorConfig::default();
        let out = correlate_hypotension(&readings(&[(80.0, 400_000)]), &readings(&[(85.0, 200_000)]), &config);
        assert_eq!(timestamps(&out), vec![400_000]);
    }

    #[test]
    fn test_hypotensive_hypoxemia_thresholds_are_strict() {
        let config = DetectorConfig::default();
        assert!(correlate_hypotension(&readings(&[(90.0, 0)]), &readings(&[(80.0, 0)]), &config).is_empty());
        assert!(correlate_hypotension(&readings(&[(80.0, 0)]), &readings(&[(92.0, 0)]), &config).is_empty());
        assert!(correlate_hypotension(&readings(&[(80.0, 0)]), &readings(&[(85.0, 300_001)]), &config).is_empty());
    }

    #[test]
    fn test_hypotensive_hypoxemia_considers_every_pair() {
        let config = DetectorConfig::default();
        let systolic = readings(&[(85.0, 0), (88.0, 100_000)]);
        let spo2 = readings(&[(90.0, 50_000), (89.0, 120_000), (97.0, 130_000)]);
        let out = correlate_hypotension(&systolic, &spo2, &config);
        assert_eq!(timestamps(&out), vec![50_000, 120_000, 100_000, 120_000]);
    }

    // Extreme timestamps

    #[test]
    fn test_hypotensive_hypoxemia_far_apart_extremes() {
        let config = DetectorConfig::default();
        let out = correlate_hypotension(&readings(&[(80.0, i64::MAX)]), &readings(&[(85.0, -1)]), &config);
        assert!(out.is_empty());
        let out = correlate_hypotension(&readings(&[(80.0, i64::MIN)]), &readings(&[(85.0, i64::MAX)]), &config);
        assert!(out.is_empty());
        // Close together at the top of the range still pair
        let out = correlate_hypotension(&readings(&[(80.0, i64::MAX - 10)]), &readings(&[(85.0, i64::MAX)]), &config);
        assert_eq!(timestamps(&out), vec![i64::MAX]);
    }

    #[test]
    fn test_rapid_drop_far_apart_extremes() {
        let r = readings(&[(99.0, i64::MIN), (90.0, 1)]);
        assert!(windowed_drops(&r, 5.0, 600_000).is_empty());
        let r = readings(&[(99.0, i64::MIN), (90.0, i64::MAX)]);
        assert!(windowed_drops(&r, 5.0, 600_000).is_empty());
        let r = readings(&[(99.0, i64::MIN), (90.0, i64::MIN + 1_000)]);
        assert_eq!(timestamps(&windowed_drops(&r, 5.0, 600_000)), vec![i64::MIN + 1_000]);
    }

    #[test]
    fn test_negative_windows_match_nothing() {
        let r = readings(&[(98.0, 0), (90.0, 0)]);
        assert!(windowed_drops(&r, 5.0, -1).is_empty());
        let config = DetectorConfig {
            correlation_window_ms: -1,
            ..DetectorConfig::default()
        };
        assert!(correlate_hypotension(&readings(&[(80.0, 0)]), &readings(&[(85.0, 0)]), &config).is_empty());
    }

    // ECG

    #[test]
    fn test_ecg_peak_after_baseline() {
        let mut points: Vec<(f64, &str, i64)> = (0..5).map(|i| (60.0, "ECG", i)).collect();
        points.push((200.0, "ECG", 6));
        let out = ecg::abnormal_peaks(&signals(&points), &DetectorConfig::default());
        assert_eq!(out, vec![RawTrigger::new(AlertKind::AbnormalEcgPeak, 6)]);
    }

    #[test]
    fn test_ecg_flat_alternating_never_peaks() {
        let r: Vec<Reading> = (0..10)
            .map(|i| Reading::new(if i % 2 == 0 { 10.0 } else { 11.0 }, i))
            .collect();
        assert!(rolling_peaks(&r, 5, 1.5).is_empty());
    }

    #[test]
    fn test_ecg_needs_more_than_window() {
        let r = readings(&[(1.0, 1), (1.0, 2), (1.0, 3), (1.0, 4), (100.0, 5)]);
        assert!(rolling_peaks(&r, 5, 1.5).is_empty());
        assert!(rolling_peaks(&r, 0, 1.5).is_empty());
    }

    #[test]
    fn test_ecg_window_slides_one_at_a_time() {
        // Spike at index 5 raises the mean that index 6 is compared against
        let r = readings(&[
            (10.0, 0),
            (10.0, 1),
            (10.0, 2),
            (10.0, 3),
            (10.0, 4),
            (40.0, 5),
            (20.0, 6),
        ]);
        let out = rolling_peaks(&r, 5, 1.5);
        // mean before idx 6 is 16, 20 < 24
        assert_eq!(timestamps(&out), vec![5]);
    }

    // Registry

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(detect_all(&classify(&[]), &DetectorConfig::default()).is_empty());
    }

    #[test]
    fn test_unknown_signal_does_not_disturb_known() {
        let s = signals(&[(999.0, "HeartRate", 1), (190.0, "Systolic", 2)]);
        let out = detect_all(&s, &DetectorConfig::default());
        assert_eq!(out, vec![RawTrigger::new(AlertKind::CriticalSystolic, 2)]);
    }

    #[test]
    fn test_detector_order_does_not_change_output() {
        let s = signals(&[
            (85.0, "Systolic", 1_000),
            (100.0, "Systolic", 2_000),
            (115.0, "Systolic", 3_000),
            (130.0, "Systolic", 4_000),
            (55.0, "Diastolic", 1_000),
            (98.0, "SpO2", 500),
            (90.0, "SpO2", 1_200),
            (60.0, "ECG", 1),
            (60.0, "ECG", 2),
            (60.0, "ECG", 3),
            (60.0, "ECG", 4),
            (60.0, "ECG", 5),
            (150.0, "ECG", 6),
        ]);
        let config = DetectorConfig::default();

        let mut expected = detect_all(&s, &config);
        expected.sort();
        assert!(!expected.is_empty());

        let n = DETECTORS.len();
        for rotation in 0..n {
            for reversed in [false, true] {
                let mut order: Vec<Detector> = DETECTORS.to_vec();
                order.rotate_left(rotation);
                if reversed {
                    order.reverse();
                }
                let mut got = detect_with(&order, &s, &config);
                got.sort();
                assert_eq!(got, expected, "rotation {} reversed {}", rotation, reversed);
            }
        }
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let s = signals(&[(190.0, "Systolic", 1), (85.0, "SpO2", 2)]);
        let config = DetectorConfig::default();
        assert_eq!(detect_all(&s, &config), detect_all(&s, &config));
    }
}

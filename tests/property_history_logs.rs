//! Property tests for the machine history log policies
//!
//! Verifies:
//! - Throttled appends never produce entries spaced 300 000 ms or less apart
//! - The edge-triggered motor log always alternates and never starts with OFF

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use irrigation_backend::history::{
    append_moisture_if_due, append_motor_event_if_changed, append_tank_level_if_due,
    LOG_THROTTLE_MS,
};
use irrigation_backend::test_utils::generators;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: whatever the push cadence, throttled log entries are always
    /// strictly more than the throttle window apart
    #[test]
    fn prop_throttled_entries_respect_spacing(
        gaps in proptest::collection::vec(1_000i64..600_000, 1..40),
        levels in proptest::collection::vec(generators::percent(), 1..40),
    ) {
        let mut log = Vec::new();
        let mut now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        for (gap_ms, level) in gaps.iter().zip(levels.iter().cycle()) {
            now += Duration::milliseconds(*gap_ms);
            append_tank_level_if_due(&mut log, *level, now);
        }

        for pair in log.windows(2) {
            let spacing = (pair[1].created_at - pair[0].created_at).num_milliseconds();
            prop_assert!(
                spacing > LOG_THROTTLE_MS,
                "entries {} ms apart, throttle is {} ms",
                spacing,
                LOG_THROTTLE_MS
            );
        }
    }

    /// Property: a push inside the window never grows the log; a push past
    /// the window always does
    #[test]
    fn prop_throttle_boundary(
        level in generators::percent(),
        extra_ms in 1i64..100_000,
    ) {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut log = Vec::new();
        append_moisture_if_due(&mut log, level, t0);

        // At or inside the window: unchanged
        let within = t0 + Duration::milliseconds(LOG_THROTTLE_MS);
        prop_assert!(!append_moisture_if_due(&mut log, level, within));
        prop_assert_eq!(log.len(), 1);

        // Strictly past the window: appended
        let past = t0 + Duration::milliseconds(LOG_THROTTLE_MS + extra_ms);
        prop_assert!(append_moisture_if_due(&mut log, level, past));
        prop_assert_eq!(log.len(), 2);
    }

    /// Property: for any reported state sequence, the motor log alternates
    /// and never begins with an OFF entry
    #[test]
    fn prop_motor_log_is_alternating_boundary_trace(
        states in generators::reported_states(50),
    ) {
        let mut log = Vec::new();
        let mut now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        for state in &states {
            now += Duration::minutes(1);
            append_motor_event_if_changed(&mut log, *state, now);
        }

        if let Some(first) = log.first() {
            prop_assert!(first.is_motor_on, "log must start with an ON event");
        }
        for pair in log.windows(2) {
            prop_assert_ne!(pair[0].is_motor_on, pair[1].is_motor_on);
        }
    }

    /// Property: an all-OFF report sequence leaves the log empty
    #[test]
    fn prop_all_off_sequence_logs_nothing(count in 0usize..50) {
        let mut log = Vec::new();
        let mut now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        for _ in 0..count {
            now += Duration::minutes(1);
            append_motor_event_if_changed(&mut log, false, now);
        }

        prop_assert!(log.is_empty());
    }
}

#[cfg(test)]
mod additional_tests {
    use super::*;

    #[test]
    fn test_exact_window_is_throttled() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut log = Vec::new();

        append_tank_level_if_due(&mut log, 50, t0);
        append_tank_level_if_due(&mut log, 40, t0 + Duration::milliseconds(300_000));
        assert_eq!(log.len(), 1);

        append_tank_level_if_due(&mut log, 40, t0 + Duration::milliseconds(300_001));
        assert_eq!(log.len(), 2);
    }
}

//! Test utilities for property-based testing
//!
//! This module provides generators for property-based tests using the
//! proptest framework: product keys, auth codes, percentage readings,
//! minute-aligned instants, and motor event logs.

pub mod generators {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use crate::domain::MotorEvent;

    /// Generate a valid 15-character alphanumeric product key
    pub fn product_key() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[A-Z0-9]{15}").unwrap()
    }

    /// Generate an invalid product key (wrong length or charset)
    pub fn invalid_product_key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("".to_string()),
            Just("SHORT".to_string()),
            Just("THISKEYISWAYTOOLONG1".to_string()),
            Just("PK12345-8901234".to_string()),
            Just("PK12345 8901234".to_string()),
        ]
    }

    /// Generate a valid 10-digit auth code
    pub fn auth_code() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[0-9]{10}").unwrap()
    }

    /// Generate a percentage reading in [0, 100]
    pub fn percent() -> impl Strategy<Value = i32> {
        0..=100i32
    }

    /// Generate an out-of-range percentage reading
    pub fn invalid_percent() -> impl Strategy<Value = i32> {
        prop_oneof![-1000..=-1i32, 101..=1000i32]
    }

    /// Generate a minute-aligned base instant in 2024
    pub fn base_instant() -> impl Strategy<Value = DateTime<Utc>> {
        // Minutes since 2024-01-01T00:00:00Z, spanning the year
        (0i64..525_000).prop_map(|minutes| {
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
        })
    }

    /// Generate strictly increasing minute-aligned instants
    pub fn monotone_instants(max_len: usize) -> impl Strategy<Value = Vec<DateTime<Utc>>> {
        (
            base_instant(),
            proptest::collection::vec(1i64..=2880, 0..max_len),
        )
            .prop_map(|(start, gaps)| {
                let mut instants = Vec::with_capacity(gaps.len());
                let mut current = start;
                for gap in gaps {
                    current += Duration::minutes(gap);
                    instants.push(current);
                }
                instants
            })
    }

    /// Generate a well-formed motor event log: alternating states starting
    /// with ON, at strictly increasing minute-aligned instants
    pub fn motor_event_log(max_len: usize) -> impl Strategy<Value = Vec<MotorEvent>> {
        monotone_instants(max_len).prop_map(|instants| {
            instants
                .into_iter()
                .enumerate()
                .map(|(i, created_at)| MotorEvent {
                    is_motor_on: i % 2 == 0,
                    created_at,
                })
                .collect()
        })
    }

    /// Generate an arbitrary sequence of reported motor states
    pub fn reported_states(max_len: usize) -> impl Strategy<Value = Vec<bool>> {
        proptest::collection::vec(any::<bool>(), 0..max_len)
    }
}

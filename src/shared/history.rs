use chrono::{DateTime, Utc};

use crate::domain::{MotorEvent, SoilMoistureEntry, WaterTankEntry};

/// Minimum spacing between throttled history entries, in milliseconds
pub const LOG_THROTTLE_MS: i64 = 300_000;

/// Throttle policy shared by the tank and soil-moisture logs: a new entry is
/// due when the log is empty or the last entry is strictly older than
/// `LOG_THROTTLE_MS`.
fn throttle_elapsed(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last {
        None => true,
        Some(prev) => (now - prev).num_milliseconds() > LOG_THROTTLE_MS,
    }
}

/// Append a water tank reading if the throttle window has elapsed.
/// Returns true if an entry was appended.
pub fn append_tank_level_if_due(
    log: &mut Vec<WaterTankEntry>,
    water_level: i32,
    now: DateTime<Utc>,
) -> bool {
    if throttle_elapsed(log.last().map(|e| e.created_at), now) {
        log.push(WaterTankEntry {
            water_level,
            created_at: now,
        });
        true
    } else {
        false
    }
}

/// Append a soil moisture reading if the throttle window has elapsed.
/// Returns true if an entry was appended.
pub fn append_moisture_if_due(
    log: &mut Vec<SoilMoistureEntry>,
    moisture_level: i32,
    now: DateTime<Utc>,
) -> bool {
    if throttle_elapsed(log.last().map(|e| e.created_at), now) {
        log.push(SoilMoistureEntry {
            moisture_level,
            created_at: now,
        });
        true
    } else {
        false
    }
}

/// Append a motor on/off event only on a state change.
///
/// An empty log records only an initial ON; an initial OFF is not logged.
/// The resulting log is a run-length-encoded boundary trace: consecutive
/// entries always alternate in state.
pub fn append_motor_event_if_changed(
    log: &mut Vec<MotorEvent>,
    is_motor_on: bool,
    now: DateTime<Utc>,
) -> bool {
    let should_append = match log.last() {
        None => is_motor_on,
        Some(last) => last.is_motor_on != is_motor_on,
    };

    if should_append {
        log.push(MotorEvent {
            is_motor_on,
            created_at: now,
        });
    }
    should_append
}

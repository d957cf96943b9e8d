use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ControlMode, Machine};
use crate::history::{append_moisture_if_due, append_motor_event_if_changed, append_tank_level_if_due};

/// Tank level at or below which every motor is forced off
pub const LOW_WATER_CUTOFF_PCT: i32 = 10;

/// One probe's readings as reported by the device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReading {
    /// Measured soil moisture percentage [0, 100]
    pub moisture: i32,
    /// Motor state the device is currently running with
    pub is_motor_on: bool,
}

/// One telemetry push from a machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryReading {
    /// Measured water tank level percentage [0, 100]
    pub water_level: i32,
    /// Per-probe readings, in probe order
    pub probes: Vec<ProbeReading>,
}

/// Outcome of the actuation pass over a machine's current readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationOutcome {
    /// Tank at or below the cutoff: every motor forced off, threshold skipped
    LowWaterForcedOff,
    /// Automatic mode: per-probe threshold decisions applied
    ThresholdApplied,
    /// Manual mode: commanded states left as the operator set them
    ManualUnchanged,
}

/// Outcome of an explicit manual motor command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualCommandOutcome {
    Applied,
    /// Tank too low: mode switched to manual but the command was refused
    RefusedLowWater,
}

/// Reduce N independent probe readings to one representative moisture value.
/// Arithmetic mean; identity for a single probe. Callers guarantee N >= 1.
pub fn average_moisture(values: &[i32]) -> f64 {
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}

/// Threshold comparison for one probe: run the motor while the soil is
/// drier than the threshold.
pub fn decide_motor_on(moisture: i32, threshold: i32) -> bool {
    moisture < threshold
}

pub fn is_tank_low(water_tank_level: i32) -> bool {
    water_tank_level <= LOW_WATER_CUTOFF_PCT
}

/// Recompute every probe's commanded motor state from the machine's current
/// readings. The low-water override is evaluated first and dominates both
/// modes; it is the only rule that overrides an explicit manual ON.
pub fn apply_actuation(machine: &mut Machine) -> ActuationOutcome {
    if is_tank_low(machine.water_tank_level) {
        for probe in &mut machine.probes {
            probe.is_motor_on = false;
        }
        return ActuationOutcome::LowWaterForcedOff;
    }

    match machine.mode {
        ControlMode::Automatic { threshold } => {
            for probe in &mut machine.probes {
                probe.is_motor_on = decide_motor_on(probe.moisture, threshold);
            }
            ActuationOutcome::ThresholdApplied
        }
        ControlMode::Manual => ActuationOutcome::ManualUnchanged,
    }
}

/// Ingest one telemetry push: update current readings, feed the history
/// logs, then run the actuation pass.
///
/// The motor log records the state the device *reported*, before any
/// decision; commanded changes show up in the log once the device applies
/// them and reports back. Callers validate ranges and probe count first.
pub fn ingest_telemetry(
    machine: &mut Machine,
    reading: &TelemetryReading,
    now: DateTime<Utc>,
) -> ActuationOutcome {
    machine.water_tank_level = reading.water_level;
    append_tank_level_if_due(&mut machine.water_tank_log, reading.water_level, now);

    for (probe, reported) in machine.probes.iter_mut().zip(reading.probes.iter()) {
        probe.moisture = reported.moisture;
        append_moisture_if_due(&mut probe.soil_moisture_log, reported.moisture, now);
        append_motor_event_if_changed(&mut probe.motor_log, reported.is_motor_on, now);
    }

    apply_actuation(machine)
}

/// Switch the machine to automatic mode with the given threshold and
/// re-decide every probe from its current moisture. A low tank keeps the
/// motors off regardless of the new threshold.
pub fn apply_threshold_update(machine: &mut Machine, threshold: i32) -> ActuationOutcome {
    machine.mode = ControlMode::Automatic { threshold };
    apply_actuation(machine)
}

/// Switch the machine to manual mode and apply explicit per-probe motor
/// commands. The mode switch sticks even when the command itself is refused
/// for low water. Callers validate that `states` matches the probe count.
pub fn apply_manual_command(machine: &mut Machine, states: &[bool]) -> ManualCommandOutcome {
    machine.mode = ControlMode::Manual;

    if is_tank_low(machine.water_tank_level) {
        for probe in &mut machine.probes {
            probe.is_motor_on = false;
        }
        return ManualCommandOutcome::RefusedLowWater;
    }

    for (probe, &state) in machine.probes.iter_mut().zip(states.iter()) {
        probe.is_motor_on = state;
    }
    ManualCommandOutcome::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_machine(probe_count: usize) -> Machine {
        Machine::new(
            "m-1",
            "PK1234567890123",
            "plot",
            "1 Orchard Road, Mysore",
            probe_count,
        )
    }

    fn reading(water_level: i32, probes: &[(i32, bool)]) -> TelemetryReading {
        TelemetryReading {
            water_level,
            probes: probes
                .iter()
                .map(|&(moisture, is_motor_on)| ProbeReading {
                    moisture,
                    is_motor_on,
                })
                .collect(),
        }
    }

    fn now() -> DateTime<Utc> {
        "2024-01-15T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_average_moisture_uniform() {
        assert_eq!(average_moisture(&[40, 40, 40, 40]), 40.0);
    }

    #[test]
    fn test_average_moisture_midpoint() {
        assert_eq!(average_moisture(&[0, 100]), 50.0);
    }

    #[test]
    fn test_average_moisture_single_probe_identity() {
        assert_eq!(average_moisture(&[73]), 73.0);
    }

    #[test]
    fn test_decide_motor_on_threshold() {
        assert!(decide_motor_on(20, 30)); // drier than threshold: ON
        assert!(!decide_motor_on(40, 30)); // wetter: OFF
        assert!(!decide_motor_on(30, 30)); // equal is not drier
    }

    #[test]
    fn test_automatic_per_probe_decisions() {
        let mut machine = test_machine(3);
        machine.mode = ControlMode::Automatic { threshold: 30 };
        machine.probes[0].moisture = 20;
        machine.probes[1].moisture = 40;
        machine.probes[2].moisture = 29;

        let outcome = apply_actuation(&mut machine);

        assert_eq!(outcome, ActuationOutcome::ThresholdApplied);
        assert_eq!(machine.motor_states(), vec![true, false, true]);
    }

    #[test]
    fn test_low_water_overrides_threshold() {
        let mut machine = test_machine(2);
        machine.mode = ControlMode::Automatic { threshold: 90 };
        machine.water_tank_level = 5;
        machine.probes[0].moisture = 10; // would be ON by threshold
        machine.probes[1].moisture = 10;

        let outcome = apply_actuation(&mut machine);

        assert_eq!(outcome, ActuationOutcome::LowWaterForcedOff);
        assert_eq!(machine.motor_states(), vec![false, false]);
    }

    #[test]
    fn test_low_water_overrides_manual_on() {
        let mut machine = test_machine(1);
        machine.mode = ControlMode::Manual;
        machine.probes[0].is_motor_on = true;
        machine.water_tank_level = 10; // cutoff is inclusive

        let outcome = apply_actuation(&mut machine);

        assert_eq!(outcome, ActuationOutcome::LowWaterForcedOff);
        assert!(!machine.probes[0].is_motor_on);
    }

    #[test]
    fn test_manual_mode_leaves_states_alone() {
        let mut machine = test_machine(2);
        machine.mode = ControlMode::Manual;
        machine.probes[0].is_motor_on = true;
        machine.probes[1].moisture = 5; // would be ON if automatic

        let outcome = apply_actuation(&mut machine);

        assert_eq!(outcome, ActuationOutcome::ManualUnchanged);
        assert_eq!(machine.motor_states(), vec![true, false]);
    }

    #[test]
    fn test_ingest_updates_levels_and_logs() {
        let mut machine = test_machine(2);
        machine.mode = ControlMode::Automatic { threshold: 30 };

        let outcome = ingest_telemetry(&mut machine, &reading(80, &[(20, false), (45, true)]), now());

        assert_eq!(outcome, ActuationOutcome::ThresholdApplied);
        assert_eq!(machine.water_tank_level, 80);
        assert_eq!(machine.probes[0].moisture, 20);
        assert_eq!(machine.probes[1].moisture, 45);

        // First push seeds the throttled logs
        assert_eq!(machine.water_tank_log.len(), 1);
        assert_eq!(machine.probes[0].soil_moisture_log.len(), 1);

        // Motor log records the reported states: probe 0 reported OFF from
        // empty (not logged), probe 1 reported ON (logged)
        assert!(machine.probes[0].motor_log.is_empty());
        assert_eq!(machine.probes[1].motor_log.len(), 1);

        // Decisions from the new readings
        assert_eq!(machine.motor_states(), vec![true, false]);
    }

    #[test]
    fn test_ingest_throttles_repeat_pushes() {
        let mut machine = test_machine(1);
        let t0 = now();

        ingest_telemetry(&mut machine, &reading(80, &[(20, false)]), t0);
        ingest_telemetry(
            &mut machine,
            &reading(78, &[(22, true)]),
            t0 + Duration::minutes(2),
        );

        // History throttled, current values always updated
        assert_eq!(machine.water_tank_log.len(), 1);
        assert_eq!(machine.probes[0].soil_moisture_log.len(), 1);
        assert_eq!(machine.water_tank_level, 78);
        assert_eq!(machine.probes[0].moisture, 22);

        // Motor events are edge-triggered, not throttled
        assert_eq!(machine.probes[0].motor_log.len(), 1);
    }

    #[test]
    fn test_threshold_update_redecides() {
        let mut machine = test_machine(2);
        machine.mode = ControlMode::Manual;
        machine.probes[0].moisture = 20;
        machine.probes[1].moisture = 40;

        let outcome = apply_threshold_update(&mut machine, 30);

        assert_eq!(outcome, ActuationOutcome::ThresholdApplied);
        assert_eq!(machine.mode, ControlMode::Automatic { threshold: 30 });
        assert_eq!(machine.motor_states(), vec![true, false]);
    }

    #[test]
    fn test_threshold_update_on_low_tank_keeps_motors_off() {
        let mut machine = test_machine(1);
        machine.water_tank_level = 8;
        machine.probes[0].moisture = 5;

        let outcome = apply_threshold_update(&mut machine, 90);

        assert_eq!(outcome, ActuationOutcome::LowWaterForcedOff);
        assert_eq!(machine.mode, ControlMode::Automatic { threshold: 90 });
        assert!(!machine.probes[0].is_motor_on);
    }

    #[test]
    fn test_manual_command_applies_states() {
        let mut machine = test_machine(3);

        let outcome = apply_manual_command(&mut machine, &[true, false, true]);

        assert_eq!(outcome, ManualCommandOutcome::Applied);
        assert!(machine.mode.is_manual());
        assert_eq!(machine.motor_states(), vec![true, false, true]);
    }

    #[test]
    fn test_manual_command_refused_on_low_tank() {
        let mut machine = test_machine(1);
        machine.water_tank_level = 3;

        let outcome = apply_manual_command(&mut machine, &[true]);

        assert_eq!(outcome, ManualCommandOutcome::RefusedLowWater);
        // Mode switch sticks, command does not
        assert!(machine.mode.is_manual());
        assert!(!machine.probes[0].is_motor_on);
    }

    #[test]
    fn test_manual_state_pinned_across_ingest() {
        let mut machine = test_machine(1);
        apply_manual_command(&mut machine, &[true]);

        // Device reports wet soil; manual mode ignores the threshold engine
        let outcome = ingest_telemetry(&mut machine, &reading(80, &[(95, true)]), now());

        assert_eq!(outcome, ActuationOutcome::ManualUnchanged);
        assert!(machine.probes[0].is_motor_on);
    }
}

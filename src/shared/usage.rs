use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use tracing::warn;

use crate::domain::{DailyUsageEntry, Machine, Probe};

/// Default fixed UTC offset for calendar-day bucketing: +05:30
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Build a `FixedOffset` from an offset in minutes east of UTC.
/// Returns None outside the valid +/-24h range.
pub fn utc_offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes * 60)
}

/// The default +05:30 bucketing offset
pub fn default_utc_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).expect("+05:30 is a valid offset")
}

fn local_day(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// First instant of the local calendar day after the one containing
/// `instant`, expressed back in UTC.
fn next_local_midnight(instant: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let next_day = local_day(instant, offset)
        .succ_opt()
        .expect("calendar day overflow");
    let naive_utc = next_day
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(naive_utc, Utc)
}

/// Find-or-create the bucket for `day` and add `minutes` to it.
///
/// Source events are monotonic, so the table only ever grows in day order:
/// "found" means the last appended entry is for the same local date.
fn credit_day(usage: &mut Vec<DailyUsageEntry>, day: NaiveDate, minutes: i64) {
    match usage.last_mut() {
        Some(last) if last.created_at == day => last.duration_minutes += minutes,
        _ => usage.push(DailyUsageEntry {
            duration_minutes: minutes,
            created_at: day,
        }),
    }
}

/// Credit one full ON..OFF run to the day buckets, splitting at local
/// midnights. Each segment's length is truncated to whole minutes.
fn credit_run(
    usage: &mut Vec<DailyUsageEntry>,
    on_at: DateTime<Utc>,
    off_at: DateTime<Utc>,
    offset: FixedOffset,
) {
    let mut current = on_at;
    while current < off_at {
        let midnight = next_local_midnight(current, offset);
        let segment_end = midnight.min(off_at);
        let minutes = (segment_end - current).num_minutes();
        credit_day(usage, local_day(current, offset), minutes);
        current = segment_end;
    }
}

/// Consolidate one probe's motor event log into its per-day usage table.
///
/// Processes only full (ON, OFF) pairs. Afterwards the log is truncated: a
/// dangling trailing ON is retained so the in-progress run resumes on the
/// next invocation; otherwise the log is cleared. Consolidating an empty or
/// already-cleared log is a no-op.
pub fn consolidate_probe(probe: &mut Probe, offset: FixedOffset) {
    // By construction the log starts with an ON transition. A leading OFF
    // is a malformed document; tolerate it so a single bad machine cannot
    // take down the usage read path.
    let start = match probe.motor_log.first() {
        None => return,
        Some(first) if first.is_motor_on => 0,
        Some(first) => {
            warn!(
                created_at = %first.created_at,
                "motor log begins with an OFF event, skipping it"
            );
            1
        }
    };

    let events = &probe.motor_log[start..];
    for pair in events.chunks_exact(2) {
        credit_run(
            &mut probe.motor_usage_per_day,
            pair[0].created_at,
            pair[1].created_at,
            offset,
        );
    }

    if events.len() % 2 == 1 {
        // Unmatched trailing ON: keep only that entry
        let dangling = events[events.len() - 1].clone();
        probe.motor_log = vec![dangling];
    } else {
        probe.motor_log.clear();
    }
}

/// Consolidate every probe of a machine
pub fn consolidate_machine(machine: &mut Machine, offset: FixedOffset) {
    for probe in &mut machine.probes {
        consolidate_probe(probe, offset);
    }
}

/// Merge the per-probe usage tables into one day-ordered view, summing
/// minutes across probes that ran on the same day. Display helper; the
/// per-probe tables remain the stored source of truth.
pub fn merged_daily_usage(machine: &Machine) -> Vec<DailyUsageEntry> {
    let mut by_day: std::collections::BTreeMap<NaiveDate, i64> = std::collections::BTreeMap::new();
    for probe in &machine.probes {
        for entry in &probe.motor_usage_per_day {
            *by_day.entry(entry.created_at).or_insert(0) += entry.duration_minutes;
        }
    }
    by_day
        .into_iter()
        .map(|(created_at, duration_minutes)| DailyUsageEntry {
            duration_minutes,
            created_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MotorEvent;

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn probe_with_log(events: &[(bool, &str)]) -> Probe {
        let mut probe = Probe::new();
        probe.motor_log = events
            .iter()
            .map(|&(is_motor_on, at)| MotorEvent {
                is_motor_on,
                created_at: instant(at),
            })
            .collect();
        probe
    }

    #[test]
    fn test_empty_log_is_noop() {
        let mut probe = Probe::new();
        consolidate_probe(&mut probe, default_utc_offset());
        assert!(probe.motor_log.is_empty());
        assert!(probe.motor_usage_per_day.is_empty());
    }

    #[test]
    fn test_single_run_within_one_day() {
        // 10:00 to 10:45 IST
        let mut probe = probe_with_log(&[
            (true, "2024-01-15T04:30:00Z"),
            (false, "2024-01-15T05:15:00Z"),
        ]);

        consolidate_probe(&mut probe, default_utc_offset());

        assert_eq!(probe.motor_usage_per_day.len(), 1);
        assert_eq!(probe.motor_usage_per_day[0].created_at, day("2024-01-15"));
        assert_eq!(probe.motor_usage_per_day[0].duration_minutes, 45);
        assert!(probe.motor_log.is_empty());
    }

    #[test]
    fn test_run_crossing_midnight_splits() {
        // ON at 23:50 IST Jan 15, OFF at 00:10 IST Jan 16
        let mut probe = probe_with_log(&[
            (true, "2024-01-15T18:20:00Z"),
            (false, "2024-01-15T18:40:00Z"),
        ]);

        consolidate_probe(&mut probe, default_utc_offset());

        assert_eq!(probe.motor_usage_per_day.len(), 2);
        assert_eq!(probe.motor_usage_per_day[0].created_at, day("2024-01-15"));
        assert_eq!(probe.motor_usage_per_day[0].duration_minutes, 10);
        assert_eq!(probe.motor_usage_per_day[1].created_at, day("2024-01-16"));
        assert_eq!(probe.motor_usage_per_day[1].duration_minutes, 10);
        assert!(probe.motor_log.is_empty());
    }

    #[test]
    fn test_run_spanning_multiple_days() {
        // ON at 22:00 IST Jan 15, OFF at 01:00 IST Jan 18: intermediate
        // days get the full 1440 minutes
        let mut probe = probe_with_log(&[
            (true, "2024-01-15T16:30:00Z"),
            (false, "2024-01-17T19:30:00Z"),
        ]);

        consolidate_probe(&mut probe, default_utc_offset());

        assert_eq!(probe.motor_usage_per_day.len(), 4);
        assert_eq!(probe.motor_usage_per_day[0].duration_minutes, 120);
        assert_eq!(probe.motor_usage_per_day[1].duration_minutes, 1440);
        assert_eq!(probe.motor_usage_per_day[1].created_at, day("2024-01-16"));
        assert_eq!(probe.motor_usage_per_day[2].duration_minutes, 1440);
        assert_eq!(probe.motor_usage_per_day[3].duration_minutes, 60);
    }

    #[test]
    fn test_multiple_runs_accumulate_same_day() {
        let mut probe = probe_with_log(&[
            (true, "2024-01-15T04:00:00Z"),
            (false, "2024-01-15T04:30:00Z"),
            (true, "2024-01-15T06:00:00Z"),
            (false, "2024-01-15T06:20:00Z"),
        ]);

        consolidate_probe(&mut probe, default_utc_offset());

        assert_eq!(probe.motor_usage_per_day.len(), 1);
        assert_eq!(probe.motor_usage_per_day[0].duration_minutes, 50);
    }

    #[test]
    fn test_dangling_on_retained() {
        let mut probe = probe_with_log(&[(true, "2024-01-15T04:30:00Z")]);

        consolidate_probe(&mut probe, default_utc_offset());

        assert!(probe.motor_usage_per_day.is_empty());
        assert_eq!(probe.motor_log.len(), 1);
        assert!(probe.motor_log[0].is_motor_on);
        assert_eq!(probe.motor_log[0].created_at, instant("2024-01-15T04:30:00Z"));
    }

    #[test]
    fn test_odd_log_consolidates_pairs_and_keeps_tail() {
        let mut probe = probe_with_log(&[
            (true, "2024-01-15T04:00:00Z"),
            (false, "2024-01-15T04:30:00Z"),
            (true, "2024-01-15T09:00:00Z"),
        ]);

        consolidate_probe(&mut probe, default_utc_offset());

        assert_eq!(probe.motor_usage_per_day.len(), 1);
        assert_eq!(probe.motor_usage_per_day[0].duration_minutes, 30);
        assert_eq!(probe.motor_log.len(), 1);
        assert_eq!(probe.motor_log[0].created_at, instant("2024-01-15T09:00:00Z"));
    }

    #[test]
    fn test_resumed_run_accumulates_on_next_invocation() {
        let mut probe = probe_with_log(&[(true, "2024-01-15T04:00:00Z")]);
        consolidate_probe(&mut probe, default_utc_offset());

        // Device reports OFF later; the retained ON pairs with it
        probe.motor_log.push(MotorEvent {
            is_motor_on: false,
            created_at: instant("2024-01-15T05:00:00Z"),
        });
        consolidate_probe(&mut probe, default_utc_offset());

        assert_eq!(probe.motor_usage_per_day.len(), 1);
        assert_eq!(probe.motor_usage_per_day[0].duration_minutes, 60);
        assert!(probe.motor_log.is_empty());
    }

    #[test]
    fn test_reconsolidation_is_idempotent() {
        let mut probe = probe_with_log(&[
            (true, "2024-01-15T04:00:00Z"),
            (false, "2024-01-15T04:30:00Z"),
        ]);

        consolidate_probe(&mut probe, default_utc_offset());
        let after_first = probe.motor_usage_per_day.clone();

        consolidate_probe(&mut probe, default_utc_offset());
        assert_eq!(probe.motor_usage_per_day, after_first);
    }

    #[test]
    fn test_leading_off_skipped() {
        let mut probe = probe_with_log(&[
            (false, "2024-01-15T03:00:00Z"),
            (true, "2024-01-15T04:00:00Z"),
            (false, "2024-01-15T04:15:00Z"),
        ]);

        consolidate_probe(&mut probe, default_utc_offset());

        assert_eq!(probe.motor_usage_per_day.len(), 1);
        assert_eq!(probe.motor_usage_per_day[0].duration_minutes, 15);
        assert!(probe.motor_log.is_empty());
    }

    #[test]
    fn test_durations_truncate_to_whole_minutes() {
        let mut probe = probe_with_log(&[
            (true, "2024-01-15T04:00:10Z"),
            (false, "2024-01-15T04:01:59Z"),
        ]);

        consolidate_probe(&mut probe, default_utc_offset());

        assert_eq!(probe.motor_usage_per_day[0].duration_minutes, 1);
    }

    #[test]
    fn test_offset_is_configurable() {
        // Same instants, UTC bucketing: 23:50 -> 00:10 UTC crosses the UTC
        // midnight instead of the IST one
        let mut probe = probe_with_log(&[
            (true, "2024-01-15T23:50:00Z"),
            (false, "2024-01-16T00:10:00Z"),
        ]);

        let utc = utc_offset_from_minutes(0).unwrap();
        consolidate_probe(&mut probe, utc);

        assert_eq!(probe.motor_usage_per_day.len(), 2);
        assert_eq!(probe.motor_usage_per_day[0].created_at, day("2024-01-15"));
        assert_eq!(probe.motor_usage_per_day[1].created_at, day("2024-01-16"));
    }

    #[test]
    fn test_consolidate_machine_covers_all_probes() {
        let mut machine = Machine::new(
            "m-1",
            "PK1234567890123",
            "plot",
            "1 Orchard Road, Mysore",
            2,
        );
        machine.probes[0] = probe_with_log(&[
            (true, "2024-01-15T04:00:00Z"),
            (false, "2024-01-15T04:30:00Z"),
        ]);
        machine.probes[1] = probe_with_log(&[(true, "2024-01-15T05:00:00Z")]);

        consolidate_machine(&mut machine, default_utc_offset());

        assert_eq!(machine.probes[0].motor_usage_per_day.len(), 1);
        assert!(machine.probes[0].motor_log.is_empty());
        assert!(machine.probes[1].motor_usage_per_day.is_empty());
        assert_eq!(machine.probes[1].motor_log.len(), 1);
    }

    #[test]
    fn test_merged_daily_usage_sums_across_probes() {
        let mut machine = Machine::new(
            "m-1",
            "PK1234567890123",
            "plot",
            "1 Orchard Road, Mysore",
            2,
        );
        machine.probes[0].motor_usage_per_day = vec![
            DailyUsageEntry {
                duration_minutes: 30,
                created_at: day("2024-01-15"),
            },
            DailyUsageEntry {
                duration_minutes: 10,
                created_at: day("2024-01-16"),
            },
        ];
        machine.probes[1].motor_usage_per_day = vec![DailyUsageEntry {
            duration_minutes: 45,
            created_at: day("2024-01-15"),
        }];

        let merged = merged_daily_usage(&machine);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].created_at, day("2024-01-15"));
        assert_eq!(merged[0].duration_minutes, 75);
        assert_eq!(merged[1].created_at, day("2024-01-16"));
        assert_eq!(merged[1].duration_minutes, 10);
    }

    #[test]
    fn test_usage_table_appends_in_day_order() {
        let mut probe = probe_with_log(&[
            (true, "2024-01-15T04:00:00Z"),
            (false, "2024-01-15T04:30:00Z"),
            (true, "2024-01-16T04:00:00Z"),
            (false, "2024-01-16T04:45:00Z"),
        ]);

        consolidate_probe(&mut probe, default_utc_offset());

        let days: Vec<NaiveDate> = probe
            .motor_usage_per_day
            .iter()
            .map(|e| e.created_at)
            .collect();
        assert_eq!(days, vec![day("2024-01-15"), day("2024-01-16")]);
        assert_eq!(probe.motor_usage_per_day[1].duration_minutes, 45);
    }
}

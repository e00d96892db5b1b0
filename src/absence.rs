use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{AbsenceAlert, ShiftRecord};

/// A courier only counts as active (and therefore alertable) with at least
/// one record in the last 15 days.
pub const ACTIVE_LOOKBACK_DAYS: i64 = 15;

/// Scans the trailing window of calendar days ending yesterday and flags
/// active couriers whose longest contiguous run of absent days reached
/// `threshold`. `today` is supplied by the caller; the day in progress is
/// never part of the window.
///
/// A courier with no record in today's calendar month is suppressed even
/// when the run qualifies: the operation treats "no schedule this month" as
/// departed rather than absent. Intentional per the dispatch team, revisit
/// only with them.
pub fn detect_absences(
    records: &[ShiftRecord],
    today: NaiveDate,
    window_days: i64,
    threshold: i64,
) -> Vec<AbsenceAlert> {
    if window_days <= 0 || threshold <= 0 {
        return Vec::new();
    }

    let window_end = today - Duration::days(1);
    let window_start = window_end - Duration::days(window_days - 1);
    let active_cutoff = today - Duration::days(ACTIVE_LOOKBACK_DAYS);

    // Distinct active couriers in first-seen table order.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut active: Vec<&str> = Vec::new();
    for record in records {
        if record.period_date >= active_cutoff && seen.insert(record.courier_key.as_str()) {
            active.push(record.courier_key.as_str());
        }
    }

    let mut alerts = Vec::new();
    for key in active {
        let rows: Vec<&ShiftRecord> = records.iter().filter(|r| r.courier_key == key).collect();

        let scheduled_this_month = rows
            .iter()
            .any(|r| r.period_month == today.month() && r.period_year == today.year());
        if !scheduled_this_month {
            continue;
        }

        let presences: HashSet<NaiveDate> = rows.iter().map(|r| r.period_date).collect();

        let mut run = 0i64;
        let mut longest = 0i64;
        let mut day = window_start;
        while day <= window_end {
            if presences.contains(&day) {
                run = 0;
            } else {
                run += 1;
                longest = longest.max(run);
            }
            day += Duration::days(1);
        }

        if longest >= threshold {
            let last_presence = presences
                .iter()
                .filter(|d| **d <= window_end)
                .max()
                .copied();
            alerts.push(AbsenceAlert {
                courier_name: rows[0].courier_name.clone(),
                run_length: longest,
                last_presence,
            });
        }
    }

    alerts
}

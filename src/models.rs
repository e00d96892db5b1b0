use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::normalize::normalize_name;

/// One row of the activity table: a single shift worked (or scheduled) by a
/// courier. Derived columns are filled in once at load time.
#[derive(Debug, Clone)]
pub struct ShiftRecord {
    pub courier_name: String,
    pub courier_key: String,
    pub period_date: NaiveDate,
    pub period_month: u32,
    pub period_year: i32,
    pub available_secs: i64,
    pub duration_secs: i64,
    pub offered: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub completed: i64,
}

impl ShiftRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        courier_name: &str,
        period_date: NaiveDate,
        available_secs: i64,
        duration_secs: i64,
        offered: i64,
        accepted: i64,
        rejected: i64,
        completed: i64,
    ) -> Self {
        ShiftRecord {
            courier_name: courier_name.to_string(),
            courier_key: normalize_name(courier_name),
            period_date,
            period_month: period_date.month(),
            period_year: period_date.year(),
            available_secs,
            duration_secs,
            offered,
            accepted,
            rejected,
            completed,
        }
    }
}

/// The time window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodSelector {
    Month { month: u32, year: i32 },
    Range { start: NaiveDate, end: NaiveDate },
    AllTime,
}

/// Attendance and trip-funnel numbers for one courier over one period.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport {
    pub courier_name: String,
    pub period_label: String,
    pub expected_days: i64,
    pub presences: i64,
    pub absences: i64,
    pub online_pct: f64,
    pub shifts: usize,
    pub offered: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub completed: i64,
    pub accept_rate: f64,
    pub reject_rate: f64,
    pub completion_rate: f64,
}

/// A courier whose longest absence run inside the trailing window reached
/// the alert threshold. `last_presence` is None when the courier has no
/// record inside the window at all.
#[derive(Debug, Clone, Serialize)]
pub struct AbsenceAlert {
    pub courier_name: String,
    pub run_length: i64,
    pub last_presence: Option<NaiveDate>,
}

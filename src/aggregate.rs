use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{PeriodReport, PeriodSelector, ShiftRecord};

const MONTH_NAMES_PT: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Attendance and trip report for one courier over one period.
///
/// Returns None when the courier has no record in the period; callers
/// render that as "no data", not as an error. Degenerate denominators
/// (no offered trips, zero mean duration) yield 0.0. The source data may
/// report more accepted than offered trips; rates above 100% pass through.
pub fn aggregate(
    records: &[ShiftRecord],
    courier_key: &str,
    selector: &PeriodSelector,
) -> Option<PeriodReport> {
    let rows: Vec<&ShiftRecord> = records
        .iter()
        .filter(|r| r.courier_key == courier_key)
        .filter(|r| match selector {
            PeriodSelector::Month { month, year } => {
                r.period_month == *month && r.period_year == *year
            }
            PeriodSelector::Range { start, end } => {
                r.period_date >= *start && r.period_date <= *end
            }
            PeriodSelector::AllTime => true,
        })
        .collect();

    if rows.is_empty() {
        return None;
    }

    let mean_available = mean(rows.iter().map(|r| r.available_secs));
    let mean_duration = mean(rows.iter().map(|r| r.duration_secs));
    let online_pct = if mean_duration > 0.0 {
        round1(mean_available / mean_duration * 100.0)
    } else {
        0.0
    };

    let dates: BTreeSet<NaiveDate> = rows.iter().map(|r| r.period_date).collect();
    let presences = dates.len() as i64;
    // rows is non-empty, so both bounds exist
    let min_date = dates.iter().next().copied()?;
    let max_date = dates.iter().next_back().copied()?;

    let expected_days = match selector {
        PeriodSelector::Month { month, year } => days_in_month(*month, *year),
        PeriodSelector::Range { start, end } => (*end - *start).num_days() + 1,
        PeriodSelector::AllTime => (max_date - min_date).num_days() + 1,
    };
    let absences = expected_days - presences;

    let offered: i64 = rows.iter().map(|r| r.offered).sum();
    let accepted: i64 = rows.iter().map(|r| r.accepted).sum();
    let rejected: i64 = rows.iter().map(|r| r.rejected).sum();
    let completed: i64 = rows.iter().map(|r| r.completed).sum();

    let period_label = match selector {
        PeriodSelector::Month { month, year } => month_label(*month, *year),
        _ => format!(
            "{} a {}",
            min_date.format("%d/%m/%Y"),
            max_date.format("%d/%m/%Y")
        ),
    };

    Some(PeriodReport {
        courier_name: rows[0].courier_name.clone(),
        period_label,
        expected_days,
        presences,
        absences,
        online_pct,
        shifts: rows.len(),
        offered,
        accepted,
        rejected,
        completed,
        accept_rate: ratio_pct(accepted, offered),
        reject_rate: ratio_pct(rejected, offered),
        completion_rate: ratio_pct(completed, accepted),
    })
}

/// One report per selector, in input order, skipping periods with no data.
pub fn compose(
    records: &[ShiftRecord],
    courier_key: &str,
    selectors: &[PeriodSelector],
) -> Vec<PeriodReport> {
    selectors
        .iter()
        .filter_map(|selector| aggregate(records, courier_key, selector))
        .collect()
}

/// The most recent `n` calendar months actually present in the data for
/// this courier, as month selectors in ascending order. Derived entirely
/// from the records, never from the wall clock.
pub fn recent_months(records: &[ShiftRecord], courier_key: &str, n: usize) -> Vec<PeriodSelector> {
    let pairs: BTreeSet<(i32, u32)> = records
        .iter()
        .filter(|r| r.courier_key == courier_key)
        .map(|r| (r.period_year, r.period_month))
        .collect();

    pairs
        .into_iter()
        .rev()
        .take(n)
        .rev()
        .map(|(year, month)| PeriodSelector::Month { month, year })
        .collect()
}

/// Calendar length of a (month, year) pair; 0 for an out-of-range month.
pub fn days_in_month(month: u32, year: i32) -> i64 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month >= 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days(),
        _ => 0,
    }
}

fn month_label(month: u32, year: i32) -> String {
    let name = month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES_PT.get(i as usize));
    match name {
        Some(name) => format!("{name}/{year}"),
        None => format!("{month:02}/{year}"),
    }
}

fn mean(values: impl Iterator<Item = i64>) -> f64 {
    let mut sum = 0i64;
    let mut count = 0i64;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

fn ratio_pct(numerator: i64, denominator: i64) -> f64 {
    if denominator <= 0 {
        0.0
    } else {
        round1(numerator as f64 / denominator as f64 * 100.0)
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn shift(name: &str, date: NaiveDate) -> ShiftRecord {
        // 6h online out of an 8h shift, modest funnel numbers
        ShiftRecord::new(name, date, 21_600, 28_800, 5, 4, 1, 3)
    }

    fn march_selector() -> PeriodSelector {
        PeriodSelector::Month { month: 3, year: 2025 }
    }

    #[test]
    fn month_report_matches_known_scenario() {
        // 20 presence days in March 2025, one shift each: offered 100,
        // accepted 80, rejected 20, completed 75 in total.
        let mut records = Vec::new();
        for d in 1..=20 {
            let completed = if d <= 15 { 4 } else { 3 };
            records.push(ShiftRecord::new(
                "Ana Silva",
                day(2025, 3, d),
                21_600,
                28_800,
                5,
                4,
                1,
                completed,
            ));
        }

        let report = aggregate(&records, "ana silva", &march_selector()).unwrap();
        assert_eq!(report.expected_days, 31);
        assert_eq!(report.presences, 20);
        assert_eq!(report.absences, 11);
        assert_eq!(report.online_pct, 75.0);
        assert_eq!(report.shifts, 20);
        assert_eq!(report.offered, 100);
        assert_eq!(report.accepted, 80);
        assert_eq!(report.rejected, 20);
        assert_eq!(report.completed, 75);
        assert_eq!(report.accept_rate, 80.0);
        assert_eq!(report.reject_rate, 20.0);
        assert_eq!(report.completion_rate, 93.8);
        assert_eq!(report.period_label, "Março/2025");
    }

    #[test]
    fn report_is_invariant_under_name_normalization() {
        let records = vec![
            shift("João Souza", day(2025, 3, 3)),
            shift("JOAO SOUZA ", day(2025, 3, 4)),
        ];
        let report = aggregate(&records, "joao souza", &march_selector()).unwrap();
        assert_eq!(report.presences, 2);
        assert_eq!(report.shifts, 2);
        // display name keeps the first-seen form
        assert_eq!(report.courier_name, "João Souza");
    }

    #[test]
    fn presences_never_exceed_expected_days() {
        let records: Vec<ShiftRecord> = (1..=28)
            .map(|d| shift("Ana", day(2025, 2, d)))
            .collect();
        let report = aggregate(
            &records,
            "ana",
            &PeriodSelector::Month { month: 2, year: 2025 },
        )
        .unwrap();
        assert_eq!(report.expected_days, 28);
        assert!(report.presences <= report.expected_days);
        assert_eq!(report.absences, 0);
    }

    #[test]
    fn multiple_shifts_on_a_day_count_once_for_presence() {
        let records = vec![
            shift("Ana", day(2025, 3, 5)),
            shift("Ana", day(2025, 3, 5)),
            shift("Ana", day(2025, 3, 6)),
        ];
        let report = aggregate(&records, "ana", &march_selector()).unwrap();
        assert_eq!(report.presences, 2);
        assert_eq!(report.shifts, 3);
    }

    #[test]
    fn zero_offered_trips_yield_zero_rates() {
        let records = vec![ShiftRecord::new(
            "Ana",
            day(2025, 3, 5),
            0,
            0,
            0,
            0,
            0,
            0,
        )];
        let report = aggregate(&records, "ana", &march_selector()).unwrap();
        assert_eq!(report.online_pct, 0.0);
        assert_eq!(report.accept_rate, 0.0);
        assert_eq!(report.reject_rate, 0.0);
        assert_eq!(report.completion_rate, 0.0);
    }

    #[test]
    fn rates_may_exceed_one_hundred_percent() {
        // Source data sometimes reports more accepted than offered; the
        // aggregator must pass it through instead of failing.
        let records = vec![ShiftRecord::new(
            "Ana",
            day(2025, 3, 5),
            0,
            0,
            2,
            5,
            0,
            5,
        )];
        let report = aggregate(&records, "ana", &march_selector()).unwrap();
        assert_eq!(report.accept_rate, 250.0);
    }

    #[test]
    fn empty_period_is_absent_not_empty_report() {
        let records = vec![shift("Ana", day(2025, 3, 5))];
        let gone = aggregate(
            &records,
            "ana",
            &PeriodSelector::Month { month: 4, year: 2025 },
        );
        assert!(gone.is_none());
        assert!(aggregate(&records, "ninguem", &march_selector()).is_none());
    }

    #[test]
    fn range_bound_expected_days_span_the_request() {
        let records = vec![
            shift("Ana", day(2025, 3, 10)),
            shift("Ana", day(2025, 3, 12)),
        ];
        let selector = PeriodSelector::Range {
            start: day(2025, 3, 1),
            end: day(2025, 3, 15),
        };
        let report = aggregate(&records, "ana", &selector).unwrap();
        assert_eq!(report.expected_days, 15);
        assert_eq!(report.presences, 2);
        assert_eq!(report.absences, 13);
        // the label shows the observed dates, not the requested bounds
        assert_eq!(report.period_label, "10/03/2025 a 12/03/2025");
    }

    #[test]
    fn all_time_expected_days_span_observed_dates() {
        let records = vec![
            shift("Ana", day(2025, 2, 27)),
            shift("Ana", day(2025, 3, 2)),
        ];
        let report = aggregate(&records, "ana", &PeriodSelector::AllTime).unwrap();
        assert_eq!(report.expected_days, 4);
        assert_eq!(report.presences, 2);
        assert_eq!(report.absences, 2);
        assert_eq!(report.period_label, "27/02/2025 a 02/03/2025");
    }

    #[test]
    fn compose_keeps_input_order_and_skips_empty_periods() {
        let records = vec![
            shift("Ana", day(2025, 1, 10)),
            shift("Ana", day(2025, 3, 10)),
        ];
        let selectors = [
            PeriodSelector::Month { month: 1, year: 2025 },
            PeriodSelector::Month { month: 2, year: 2025 },
            PeriodSelector::Month { month: 3, year: 2025 },
        ];
        let reports = compose(&records, "ana", &selectors);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].period_label, "Janeiro/2025");
        assert_eq!(reports[1].period_label, "Março/2025");
    }

    #[test]
    fn recent_months_come_from_the_data_only() {
        let records = vec![
            shift("Ana", day(2024, 11, 2)),
            shift("Ana", day(2025, 1, 15)),
            shift("Ana", day(2025, 1, 20)),
            shift("Ana", day(2025, 3, 1)),
            shift("Outro Nome", day(2025, 4, 1)),
        ];
        let months = recent_months(&records, "ana", 2);
        assert_eq!(
            months,
            vec![
                PeriodSelector::Month { month: 1, year: 2025 },
                PeriodSelector::Month { month: 3, year: 2025 },
            ]
        );
        // fewer months present than requested is fine
        assert_eq!(recent_months(&records, "outro nome", 3).len(), 1);
        assert!(recent_months(&records, "ninguem", 2).is_empty());
    }

    #[test]
    fn month_lengths_handle_leap_years() {
        assert_eq!(days_in_month(2, 2024), 29);
        assert_eq!(days_in_month(2, 2025), 28);
        assert_eq!(days_in_month(12, 2025), 31);
        assert_eq!(days_in_month(0, 2025), 0);
        assert_eq!(days_in_month(13, 2025), 0);
    }
}

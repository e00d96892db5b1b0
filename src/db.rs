use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::ShiftRecord;
use crate::normalize::normalize_name;
use crate::timeparse::{parse_seconds, to_seconds};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Counters describing one CSV import. Rows without a usable courier name
/// or period date are skipped; unparseable duration cells become zero
/// seconds but the row is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportSummary {
    pub rows_read: usize,
    pub inserted: usize,
    pub skipped_rows: usize,
    pub malformed_durations: usize,
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let couriers = vec![
        (
            Uuid::parse_str("6f2c9a1e-41d8-4f5b-9f7e-2a90c1b3d411")?,
            "Ana Beatriz Souza",
        ),
        (
            Uuid::parse_str("b81d3c72-5a06-4c1f-8d2e-74f0a9e6c522")?,
            "João Pedro Lima",
        ),
        (
            Uuid::parse_str("2e94f7a3-8b15-4d60-a1c9-5d387e2f0633")?,
            "Marcos Vinícius Rocha",
        ),
    ];

    for (id, name) in couriers {
        upsert_courier(pool, id, name).await?;
    }

    let shifts = vec![
        ("seed-001", "Ana Beatriz Souza", (2025, 3, 3), "06:10:00", "08:00:00", 22, 18, 4, 17),
        ("seed-002", "Ana Beatriz Souza", (2025, 3, 4), "07:45:00", "08:00:00", 25, 23, 2, 22),
        ("seed-003", "Ana Beatriz Souza", (2025, 3, 6), "05:30:00", "08:00:00", 18, 12, 6, 11),
        ("seed-004", "João Pedro Lima", (2025, 3, 3), "04:00:00", "06:00:00", 15, 14, 1, 14),
        ("seed-005", "João Pedro Lima", (2025, 3, 10), "05:55:00", "06:00:00", 19, 16, 3, 15),
        ("seed-006", "Marcos Vinícius Rocha", (2025, 2, 27), "08:00:00", "08:00:00", 30, 28, 2, 26),
    ];

    for (source_key, name, (y, m, d), available, duration, offered, accepted, rejected, completed) in shifts {
        let period_date = NaiveDate::from_ymd_opt(y, m, d).context("invalid seed date")?;
        let courier_id: Uuid = sqlx::query(
            "SELECT id FROM courier_reports.couriers WHERE name_key = $1",
        )
        .bind(normalize_name(name))
        .fetch_one(pool)
        .await?
        .get("id");

        sqlx::query(
            r#"
            INSERT INTO courier_reports.shifts
            (id, courier_id, period_date, available_secs, duration_secs,
             offered, accepted, rejected, completed, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(courier_id)
        .bind(period_date)
        .bind(to_seconds(Some(available)))
        .bind(to_seconds(Some(duration)))
        .bind(offered as i64)
        .bind(accepted as i64)
        .bind(rejected as i64)
        .bind(completed as i64)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Imports a CSV export of the activity spreadsheet, using the sheet's own
/// column headers. Import is idempotent through the shift `source_key`.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<ImportSummary> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        #[serde(rename = "pessoa_entregadora")]
        courier: Option<String>,
        #[serde(rename = "data_do_periodo")]
        period_at: Option<String>,
        #[serde(rename = "tempo_disponivel_absoluto")]
        available: Option<String>,
        #[serde(rename = "duracao_do_periodo")]
        duration: Option<String>,
        #[serde(rename = "numero_de_corridas_ofertadas")]
        offered: Option<i64>,
        #[serde(rename = "numero_de_corridas_aceitas")]
        accepted: Option<i64>,
        #[serde(rename = "numero_de_corridas_rejeitadas")]
        rejected: Option<i64>,
        #[serde(rename = "numero_de_corridas_completadas")]
        completed: Option<i64>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("cannot open {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();

    for result in reader.deserialize::<CsvRow>() {
        summary.rows_read += 1;
        let row = match result {
            Ok(row) => row,
            Err(_) => {
                summary.skipped_rows += 1;
                continue;
            }
        };

        let name = match row.courier.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                summary.skipped_rows += 1;
                continue;
            }
        };
        let period_date = match row.period_at.as_deref().and_then(parse_period_date) {
            Some(date) => date,
            None => {
                summary.skipped_rows += 1;
                continue;
            }
        };

        let available_secs = duration_field(row.available.as_deref(), &mut summary);
        let duration_secs = duration_field(row.duration.as_deref(), &mut summary);

        let courier_id = upsert_courier(pool, Uuid::new_v4(), &name).await?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO courier_reports.shifts
            (id, courier_id, period_date, available_secs, duration_secs,
             offered, accepted, rejected, completed, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(courier_id)
        .bind(period_date)
        .bind(available_secs)
        .bind(duration_secs)
        .bind(row.offered.unwrap_or(0).max(0))
        .bind(row.accepted.unwrap_or(0).max(0))
        .bind(row.rejected.unwrap_or(0).max(0))
        .bind(row.completed.unwrap_or(0).max(0))
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            summary.inserted += 1;
        }
    }

    Ok(summary)
}

/// Materializes the full shift table with derived columns filled in. Each
/// command loads this once and hands slices to the pure report code.
pub async fn fetch_shift_records(pool: &PgPool) -> anyhow::Result<Vec<ShiftRecord>> {
    let rows = sqlx::query(
        "SELECT c.display_name, s.period_date, s.available_secs, s.duration_secs, \
         s.offered, s.accepted, s.rejected, s.completed \
         FROM courier_reports.shifts s \
         JOIN courier_reports.couriers c ON c.id = s.courier_id \
         ORDER BY s.period_date, s.source_key",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let display_name: String = row.get("display_name");
        let period_date: NaiveDate = row.get("period_date");
        records.push(ShiftRecord::new(
            &display_name,
            period_date,
            row.get("available_secs"),
            row.get("duration_secs"),
            row.get("offered"),
            row.get("accepted"),
            row.get("rejected"),
            row.get("completed"),
        ));
    }

    Ok(records)
}

async fn upsert_courier(pool: &PgPool, id: Uuid, display_name: &str) -> anyhow::Result<Uuid> {
    let courier_id: Uuid = sqlx::query(
        r#"
        INSERT INTO courier_reports.couriers (id, display_name, name_key)
        VALUES ($1, $2, $3)
        ON CONFLICT (name_key) DO UPDATE
        SET display_name = EXCLUDED.display_name
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(display_name)
    .bind(normalize_name(display_name))
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(courier_id)
}

/// Shift timestamps arrive either as full timestamps or as bare dates, in
/// ISO or dd/mm/yyyy order. Only the calendar date matters downstream.
fn parse_period_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    None
}

fn duration_field(raw: Option<&str>, summary: &mut ImportSummary) -> i64 {
    match raw.map(str::trim) {
        None | Some("") => 0,
        Some(s) => match parse_seconds(s) {
            Some(secs) => secs,
            None => {
                summary.malformed_durations += 1;
                0
            }
        },
    }
}

use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod absence;
mod aggregate;
mod db;
mod models;
mod normalize;
mod report;
mod timeparse;

use models::PeriodSelector;

#[derive(Parser)]
#[command(name = "courier-attendance")]
#[command(about = "Attendance and performance reports for delivery couriers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import shift records from a CSV export of the activity spreadsheet
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List the couriers known to the database
    Couriers,
    /// Attendance and trip report for one courier over one period
    #[command(group(
        ArgGroup::new("period")
            .args(["month", "from"])
            .multiple(false)
    ))]
    Report {
        /// Courier name; fuzzy-matched against the known roster
        #[arg(long)]
        name: String,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Reports for the most recent calendar months present for one courier
    Recent {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 2)]
        months: usize,
        #[arg(long)]
        json: bool,
    },
    /// Couriers with long consecutive-absence runs in the trailing window
    Alerts {
        #[arg(long, default_value_t = 30)]
        window_days: i64,
        #[arg(long, default_value_t = 3)]
        threshold: i64,
        /// Reference date standing in for today; defaults to the local date
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let summary = db::import_csv(&pool, &csv).await?;
            println!(
                "Read {} rows from {}: {} inserted, {} skipped, {} malformed duration fields.",
                summary.rows_read,
                csv.display(),
                summary.inserted,
                summary.skipped_rows,
                summary.malformed_durations
            );
        }
        Commands::Couriers => {
            let records = db::fetch_shift_records(&pool).await?;
            let names = normalize::courier_names(&records);
            if names.is_empty() {
                println!("No couriers on record yet.");
            }
            for name in names {
                println!("{name}");
            }
        }
        Commands::Report {
            name,
            month,
            year,
            from,
            to,
            json,
        } => {
            let selector = build_selector(month, year, from, to)?;
            let records = db::fetch_shift_records(&pool).await?;

            let Some(courier) = resolve_courier(&records, &name) else {
                println!("No courier matching '{name}'.");
                return Ok(());
            };
            let key = normalize::normalize_name(&courier);

            match aggregate::aggregate(&records, &key, &selector) {
                Some(report) if json => println!("{}", serde_json::to_string_pretty(&report)?),
                Some(report) => print!("{}", report::render_period_report(&report)),
                None => println!("No data found for {courier} in this period."),
            }
        }
        Commands::Recent { name, months, json } => {
            let records = db::fetch_shift_records(&pool).await?;

            let Some(courier) = resolve_courier(&records, &name) else {
                println!("No courier matching '{name}'.");
                return Ok(());
            };
            let key = normalize::normalize_name(&courier);

            let selectors = aggregate::recent_months(&records, &key, months);
            let reports = aggregate::compose(&records, &key, &selectors);
            if reports.is_empty() {
                println!("No data found for {courier}.");
            } else if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print!("{}", report::render_period_reports(&reports));
            }
        }
        Commands::Alerts {
            window_days,
            threshold,
            as_of,
            json,
        } => {
            if window_days <= 0 || threshold <= 0 {
                anyhow::bail!("--window-days and --threshold must both be positive");
            }
            let today = as_of.unwrap_or_else(|| Local::now().date_naive());
            let records = db::fetch_shift_records(&pool).await?;
            let alerts = absence::detect_absences(&records, today, window_days, threshold);

            if alerts.is_empty() {
                println!("No active courier with {threshold}+ consecutive absences.");
            } else if json {
                println!("{}", serde_json::to_string_pretty(&alerts)?);
            } else {
                print!("{}", report::render_alerts(&alerts));
            }
        }
    }

    Ok(())
}

/// Turns the report flags into a period selector, rejecting inconsistent
/// combinations before any data is touched.
fn build_selector(
    month: Option<u32>,
    year: Option<i32>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> anyhow::Result<PeriodSelector> {
    match (month, year, from, to) {
        (Some(month), Some(year), None, None) => {
            if !(1..=12).contains(&month) {
                anyhow::bail!("month must be between 1 and 12, got {month}");
            }
            Ok(PeriodSelector::Month { month, year })
        }
        (None, None, Some(start), Some(end)) => {
            if end < start {
                anyhow::bail!("--to {end} is earlier than --from {start}");
            }
            Ok(PeriodSelector::Range { start, end })
        }
        (None, None, None, None) => Ok(PeriodSelector::AllTime),
        _ => anyhow::bail!("use --month with --year, or --from with --to, or neither for all time"),
    }
}

/// Resolves a free-typed name against the roster, announcing the match when
/// the input was not already exact.
fn resolve_courier(records: &[models::ShiftRecord], input: &str) -> Option<String> {
    let names = normalize::courier_names(records);
    let matched = normalize::closest_match(input, &names, 0.5)?;
    if normalize::normalize_name(matched) != normalize::normalize_name(input) {
        println!("Courier matched: {matched}");
    }
    Some(matched.to_string())
}

//! # Seed Data Generator
//!
//! Populates the database with development outlets and draft submissions.
//!
//! ## Usage
//! ```bash
//! # Seed into ./data/dayclose.db (default)
//! cargo run -p dayclose-db --bin seed
//!
//! # Specify database path
//! cargo run -p dayclose-db --bin seed -- --db ./tmp/dev.db
//! ```
//!
//! ## Generated Data
//! - Two managers, each with a handful of outlets
//! - One draft submission per outlet for yesterday's date
//!
//! Expense categories are seeded by migration, not here.

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use dayclose_core::{Outlet, Submission, SubmissionStatus};
use dayclose_db::{Database, DbConfig};

const OUTLETS: &[(&str, &str, &str)] = &[
    // (manager, outlet name, external login id)
    ("manager-aminah", "Jalan Ipoh", "A100"),
    ("manager-aminah", "Sentul Utara", "A101"),
    ("manager-aminah", "Kepong Baru", "A102"),
    ("manager-farid", "Puchong Jaya", "B200"),
    ("manager-farid", "Seri Kembangan", "B201"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./data/dayclose.db".to_string());
    tracing::info!(path = %db_path, "Seeding development database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let now = Utc::now();
    let yesterday = (now - Duration::days(1)).date_naive();

    for (manager_id, name, login) in OUTLETS {
        let outlet = Outlet {
            id: Uuid::new_v4().to_string(),
            manager_id: manager_id.to_string(),
            name: name.to_string(),
            login_id: Some(login.to_string()),
            is_active: true,
            created_at: now,
        };
        db.outlets().insert(&outlet).await?;

        let cash = 40000 + (login.len() as i64 * 1750) % 20000;
        let mp = 15000;
        let submission = Submission {
            id: Uuid::new_v4().to_string(),
            code: format!("CL-{}-{}", yesterday.format("%Y%m%d"), login),
            outlet_id: outlet.id.clone(),
            manager_id: manager_id.to_string(),
            report_date: yesterday,
            cash_sales_cents: cash,
            mp_sales_cents: mp,
            market_sales_cents: 0,
            other_sales_cents: 0,
            total_income_cents: cash + mp,
            total_expenses_cents: 0,
            net_amount_cents: cash + mp,
            status: SubmissionStatus::Draft,
            batch_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
            submitted_at: None,
            returned_at: None,
        };
        db.submissions().create(&submission, None).await?;

        tracing::info!(outlet = %name, code = %submission.code, "Seeded outlet + draft");
    }

    tracing::info!(outlets = OUTLETS.len(), "Seed complete");
    Ok(())
}

/// Reads `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}

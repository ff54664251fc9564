//! Database module for SQLite persistence.
//!
//! SQLite is the record store, the credential store, and the home of the crop-stage reference data.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Reference growth stages inserted on first start.
const DEFAULT_CROP_STAGES: &[(&str, &[&str])] = &[
    (
        "Maize",
        &["Germination", "Vegetative", "Tasseling", "Silking", "Maturity"],
    ),
    ("Beans", &["Germination", "Vegetative", "Flowering", "Pod Filling", "Maturity"]),
    ("Cassava", &["Establishment", "Canopy Development", "Root Bulking", "Maturity"]),
    ("Coffee", &["Seedling", "Vegetative", "Flowering", "Berry Development", "Harvest"]),
    ("Banana", &["Sucker", "Vegetative", "Shooting", "Bunch Filling", "Harvest"]),
];

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;
    seed_crop_stages(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            schema_version INTEGER NOT NULL DEFAULT 1,
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at)
        VALUES (1, 1, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    // photo_url is the legacy single-photo column; photo_urls holds a JSON array
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS farm_visits (
            id TEXT PRIMARY KEY,
            farmer_name TEXT NOT NULL,
            farm_id TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            village_location TEXT NOT NULL,
            gps_coordinates TEXT,
            farm_size_acres REAL NOT NULL DEFAULT 0,
            farm_type TEXT NOT NULL,
            main_crops TEXT,
            crop_stage TEXT,
            crop_issues TEXT,
            livestock_type TEXT,
            number_of_animals INTEGER,
            livestock_issues TEXT,
            visit_date TEXT NOT NULL,
            visit_type TEXT NOT NULL,
            officer_name TEXT NOT NULL,
            time_spent_hours REAL NOT NULL DEFAULT 0,
            photo_url TEXT,
            photo_urls TEXT,
            video_link TEXT,
            advice_given TEXT NOT NULL,
            follow_up_needed INTEGER NOT NULL DEFAULT 0,
            proposed_follow_up_date TEXT,
            routine_check INTEGER NOT NULL DEFAULT 0,
            routine_check_date TEXT,
            training_needed INTEGER NOT NULL DEFAULT 0,
            referral_to_specialist TEXT,
            additional_notes TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS crop_stages (
            id TEXT PRIMARY KEY,
            crop_name TEXT NOT NULL UNIQUE,
            stages TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admin_users (
            username TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_farm_visits_created_at ON farm_visits(created_at);
        CREATE INDEX IF NOT EXISTS idx_farm_visits_visit_type ON farm_visits(visit_type);
        CREATE INDEX IF NOT EXISTS idx_crop_stages_crop_name
            ON crop_stages(crop_name COLLATE NOCASE);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_crop_stages(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let now = chrono::Utc::now().to_rfc3339();

    for (crop_name, stages) in DEFAULT_CROP_STAGES {
        let stages_json = serde_json::to_string(stages).unwrap_or_else(|_| "[]".to_string());
        sqlx::query(
            "INSERT OR IGNORE INTO crop_stages (id, crop_name, stages, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(crop_name)
        .bind(&stages_json)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    Ok(())
}

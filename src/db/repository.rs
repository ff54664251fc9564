//! Database repository for record, reference-data and credential operations.
//!
//! Every mutation bumps the revision counter in `meta`.

use chrono::{SecondsFormat, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    CropIssue, CropStage, FarmType, FarmVisit, FarmVisitRecord, LivestockIssue, RevisionInfo,
    VisitType,
};

const VISIT_COLUMNS: &str = "id, farmer_name, farm_id, phone_number, village_location, \
    gps_coordinates, farm_size_acres, farm_type, main_crops, crop_stage, crop_issues, \
    livestock_type, number_of_animals, livestock_issues, visit_date, visit_type, officer_name, \
    time_spent_hours, photo_url, photo_urls, video_link, advice_given, follow_up_needed, \
    proposed_follow_up_date, routine_check, routine_check_date, training_needed, \
    referral_to_specialist, additional_notes, created_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    // ==================== VISIT OPERATIONS ====================

    /// List all visits, newest first.
    pub async fn list_visits(&self) -> Result<Vec<FarmVisit>, AppError> {
        let sql = format!(
            "SELECT {} FROM farm_visits ORDER BY created_at DESC, rowid DESC",
            VISIT_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(visit_from_row).collect())
    }

    /// Get a visit by ID.
    pub async fn get_visit(&self, id: &str) -> Result<Option<FarmVisit>, AppError> {
        let sql = format!("SELECT {} FROM farm_visits WHERE id = ?", VISIT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(visit_from_row))
    }

    /// Insert a new visit. The store assigns `id` and `created_at`.
    pub async fn insert_visit(&self, visit: &FarmVisit) -> Result<FarmVisit, AppError> {
        let mut stored = visit.clone();
        stored.id = Some(uuid::Uuid::new_v4().to_string());
        stored.created_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true));

        let record = FarmVisitRecord::from(&stored);
        let crop_issues_json = record.crop_issues.as_ref().map(serde_json::to_string).transpose()?;
        let livestock_issues_json = record
            .livestock_issues
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let photo_urls_json = record.photo_urls.as_ref().map(serde_json::to_string).transpose()?;

        let sql = format!(
            "INSERT INTO farm_visits ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, \
             ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            VISIT_COLUMNS
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.farmer_name)
            .bind(&record.farm_id)
            .bind(&record.phone_number)
            .bind(&record.village_location)
            .bind(&record.gps_coordinates)
            .bind(record.farm_size_acres)
            .bind(record.farm_type.as_str())
            .bind(&record.main_crops)
            .bind(&record.crop_stage)
            .bind(&crop_issues_json)
            .bind(&record.livestock_type)
            .bind(record.number_of_animals.map(i64::from))
            .bind(&livestock_issues_json)
            .bind(&record.visit_date)
            .bind(record.visit_type.as_str())
            .bind(&record.officer_name)
            .bind(record.time_spent_hours)
            .bind(&record.photo_url)
            .bind(&photo_urls_json)
            .bind(&record.video_link)
            .bind(&record.advice_given)
            .bind(record.follow_up_needed as i32)
            .bind(&record.proposed_follow_up_date)
            .bind(record.routine_check as i32)
            .bind(&record.routine_check_date)
            .bind(record.training_needed as i32)
            .bind(&record.referral_to_specialist)
            .bind(&record.additional_notes)
            .bind(&record.created_at)
            .execute(&mut *tx)
            .await?;

        increment_revision(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!(
            "Stored visit {} for farm {}",
            stored.id.as_deref().unwrap_or_default(),
            stored.farm_id
        );

        Ok(stored)
    }

    /// Delete a visit.
    pub async fn delete_visit(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM farm_visits WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Visit {} not found", id)));
        }

        increment_revision(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    // ==================== CROP STAGE OPERATIONS ====================

    /// List all crop stage definitions ordered by crop name.
    pub async fn list_crop_stages(&self) -> Result<Vec<CropStage>, AppError> {
        let rows = sqlx::query(
            "SELECT id, crop_name, stages, created_at FROM crop_stages ORDER BY crop_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(crop_stage_from_row).collect())
    }

    /// Find the stage definition for a crop, ignoring case.
    pub async fn find_crop_stage(&self, crop_name: &str) -> Result<Option<CropStage>, AppError> {
        let row = sqlx::query(
            "SELECT id, crop_name, stages, created_at FROM crop_stages \
             WHERE crop_name = ? COLLATE NOCASE",
        )
        .bind(crop_name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(crop_stage_from_row))
    }

    // ==================== CREDENTIAL OPERATIONS ====================

    /// Stored secret for `username`, if the account exists.
    pub async fn get_admin_secret(&self, username: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT password_hash FROM admin_users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("password_hash")))
    }

    /// Create the bootstrap admin account if it does not exist yet.
    pub async fn ensure_admin(&self, username: &str, secret: &str) -> Result<bool, AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO admin_users (username, password_hash, created_at) \
             VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(secret)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Bump the revision counter inside the caller's transaction.
async fn increment_revision(conn: &mut SqliteConnection) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn visit_from_row(row: &sqlx::sqlite::SqliteRow) -> FarmVisit {
    let farm_type_str: String = row.get("farm_type");
    let visit_type_str: String = row.get("visit_type");
    let number_of_animals: Option<i64> = row.get("number_of_animals");
    let crop_issues_str: Option<String> = row.get("crop_issues");
    let livestock_issues_str: Option<String> = row.get("livestock_issues");
    let photo_urls_str: Option<String> = row.get("photo_urls");
    let follow_up_needed: i32 = row.get("follow_up_needed");
    let routine_check: i32 = row.get("routine_check");
    let training_needed: i32 = row.get("training_needed");

    let record = FarmVisitRecord {
        id: row.get("id"),
        farmer_name: row.get("farmer_name"),
        farm_id: row.get("farm_id"),
        phone_number: row.get("phone_number"),
        village_location: row.get("village_location"),
        gps_coordinates: row.get("gps_coordinates"),
        farm_size_acres: row.get("farm_size_acres"),
        farm_type: FarmType::from_str(&farm_type_str).unwrap_or_default(),
        visit_date: row.get("visit_date"),
        visit_type: VisitType::from_str(&visit_type_str).unwrap_or_default(),
        officer_name: row.get("officer_name"),
        time_spent_hours: row.get("time_spent_hours"),
        main_crops: row.get("main_crops"),
        crop_stage: row.get("crop_stage"),
        livestock_type: row.get("livestock_type"),
        number_of_animals: number_of_animals.and_then(|n| u32::try_from(n).ok()),
        crop_issues: crop_issues_str.map(|s| parse_json_list::<CropIssue>(&s)),
        livestock_issues: livestock_issues_str.map(|s| parse_json_list::<LivestockIssue>(&s)),
        photo_url: row.get("photo_url"),
        photo_urls: photo_urls_str.map(|s| parse_json_list::<String>(&s)),
        video_link: row.get("video_link"),
        advice_given: row.get("advice_given"),
        follow_up_needed: follow_up_needed != 0,
        proposed_follow_up_date: row.get("proposed_follow_up_date"),
        routine_check: routine_check != 0,
        routine_check_date: row.get("routine_check_date"),
        training_needed: training_needed != 0,
        referral_to_specialist: row.get("referral_to_specialist"),
        additional_notes: row.get("additional_notes"),
        created_at: row.get("created_at"),
    };

    FarmVisit::from(record)
}

fn crop_stage_from_row(row: &sqlx::sqlite::SqliteRow) -> CropStage {
    let stages_str: String = row.get("stages");

    CropStage {
        id: row.get("id"),
        crop_name: row.get("crop_name"),
        stages: parse_json_list(&stages_str),
        created_at: row.get("created_at"),
    }
}

fn parse_json_list<T: serde::de::DeserializeOwned>(s: &str) -> Vec<T> {
    serde_json::from_str(s).unwrap_or_default()
}

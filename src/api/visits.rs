//! Farm visit endpoints: form submission, dashboard list, per-record views, export and delete.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

use super::{error, success, with_revision, ApiResult};
use crate::auth::SessionContext;
use crate::errors::{AppError, AppErrorWithRevision, Operation};
use crate::export::{self, ArchivePresenter, InlinePresenter};
use crate::filter::{self, TypeFilter, ALL_TYPES};
use crate::models::{available_stages, CropStage, DashboardView, FarmVisit, FarmVisitRecord};
use crate::report::{self, html, LongDate, Report};
use crate::AppState;

/// Dashboard query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListVisitsQuery {
    #[serde(default)]
    pub q: String,
    #[serde(rename = "type")]
    pub visit_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteVisitQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// POST /api/visits - Submit a visit from the form.
pub async fn create_visit(
    State(state): State<AppState>,
    Json(record): Json<FarmVisitRecord>,
) -> ApiResult<FarmVisitRecord> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let visit = FarmVisit::from(record);

    let crop_stages = if visit.profile.crop().is_some_and(|c| c.crop_stage.is_some()) {
        match state.repo.list_crop_stages().await {
            Ok(stages) => stages,
            Err(e) => return error(e.during(Operation::Submit), revision_id),
        }
    } else {
        Vec::new()
    };

    if let Err(e) = validate_submission(&visit, &crop_stages) {
        return error(e, revision_id);
    }

    match state.repo.insert_visit(&visit).await {
        Ok(stored) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(FarmVisitRecord::from(&stored), new_revision)
        }
        Err(e) => error(e.during(Operation::Submit), revision_id),
    }
}

/// GET /api/visits?q=&type= - Dashboard list, newest first.
pub async fn list_visits(
    State(state): State<AppState>,
    Query(query): Query<ListVisitsQuery>,
) -> ApiResult<DashboardView> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let visits = match state.repo.list_visits().await {
        Ok(visits) => visits,
        Err(e) => return error(e.during(Operation::Fetch), revision_id),
    };

    let type_filter = TypeFilter::parse(query.visit_type.as_deref().unwrap_or(ALL_TYPES));
    let visible = filter::filter(&visits, &query.q, &type_filter);

    let filtered_by = match type_filter {
        TypeFilter::All => None,
        TypeFilter::Exact(selector) => Some(selector),
    };

    success(
        DashboardView {
            total: visible.len(),
            filtered_by,
            visits: visible.iter().map(FarmVisitRecord::from).collect(),
        },
        revision_id,
    )
}

/// GET /api/visits/:id - Get a single visit.
pub async fn get_visit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<FarmVisitRecord> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let visit = load_visit(&state, &id, revision_id).await?;

    success(FarmVisitRecord::from(&visit), revision_id)
}

/// GET /api/visits/:id/report - Rendered sections as data.
pub async fn get_visit_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Report> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let visit = load_visit(&state, &id, revision_id).await?;

    success(report::render(&visit, &LongDate), revision_id)
}

/// GET /api/visits/:id/expanded - Rendered sections as an HTML fragment for the dashboard.
pub async fn get_visit_expanded(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppErrorWithRevision> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let visit = load_visit(&state, &id, revision_id).await?;

    Ok(Html(html::sections_html(&report::render(&visit, &LongDate))))
}

/// GET /api/visits/:id/export - Printable standalone document.
pub async fn export_visit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppErrorWithRevision> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let visit = load_visit(&state, &id, revision_id).await?;

    let exported = match &state.config.export_dir {
        Some(dir) => {
            let presenter = ArchivePresenter::new(dir.clone());
            let archived = visit.clone();
            tokio::task::spawn_blocking(move || export::export_document(&archived, &presenter))
                .await
                .map_err(|e| AppError::Internal(format!("Export task failed: {}", e)))
                .and_then(|result| result)
                .map(|(document, path)| {
                    tracing::info!("Archived export of {} to {:?}", id, path);
                    document
                })
        }
        None => export::export_document(&visit, &InlinePresenter).map(|(document, ())| document),
    };
    let document = exported.map_err(|e| with_revision(e, revision_id))?;

    let disposition = format!("inline; filename=\"{}\"", document.filename(&visit));
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.html,
    )
        .into_response())
}

/// DELETE /api/visits/:id?confirm=true - Delete a visit after explicit confirmation.
pub async fn delete_visit(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Query(query): Query<DeleteVisitQuery>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if !query.confirm {
        return error(
            AppError::Validation("Deletion must be confirmed with confirm=true".to_string()),
            revision_id,
        );
    }

    match state.repo.delete_visit(&id).await {
        Ok(()) => {
            tracing::info!(username = %session.username, "Deleted visit {}", id);
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e.during(Operation::Delete), revision_id),
    }
}

async fn load_visit(
    state: &AppState,
    id: &str,
    revision_id: i64,
) -> Result<FarmVisit, AppErrorWithRevision> {
    match state.repo.get_visit(id).await {
        Ok(Some(visit)) => Ok(visit),
        Ok(None) => Err(with_revision(
            AppError::NotFound(format!("Visit {} not found", id)),
            revision_id,
        )),
        Err(e) => Err(with_revision(e.during(Operation::Fetch), revision_id)),
    }
}

/// Check a submission before it reaches the store.
pub fn validate_submission(visit: &FarmVisit, crop_stages: &[CropStage]) -> Result<(), AppError> {
    let required = [
        ("Farmer name", &visit.farmer_name),
        ("Farm ID", &visit.farm_id),
        ("Phone number", &visit.phone_number),
        ("Village/Location", &visit.village_location),
        ("Visit date", &visit.visit_date),
        ("Officer name", &visit.officer_name),
        ("Advice given", &visit.advice_given),
    ];
    for (label, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required", label)));
        }
    }

    for (label, value) in [
        ("Farm size", visit.farm_size_acres),
        ("Time spent", visit.time_spent_hours),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::Validation(format!(
                "{} must be a non-negative number",
                label
            )));
        }
    }

    if let Some(crop) = visit.profile.crop() {
        if let Some(stage) = &crop.crop_stage {
            let allowed = available_stages(crop_stages, &crop.main_crops);
            if !allowed.iter().any(|s| s == stage) {
                return Err(AppError::Validation(format!(
                    "Crop stage '{}' is not defined for {}",
                    stage, crop.main_crops
                )));
            }
        }
    }

    Ok(())
}

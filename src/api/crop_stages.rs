//! Crop stage reference data endpoints.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::errors::Operation;
use crate::models::CropStage;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CropLookupQuery {
    #[serde(default)]
    pub crop: String,
}

/// GET /api/crop-stages - List all crop stage definitions.
pub async fn list_crop_stages(State(state): State<AppState>) -> ApiResult<Vec<CropStage>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_crop_stages().await {
        Ok(stages) => success(stages, revision_id),
        Err(e) => error(e.during(Operation::Fetch), revision_id),
    }
}

/// GET /api/crop-stages/lookup?crop= - Stages for one crop; empty when the crop is unknown.
pub async fn lookup_crop_stages(
    State(state): State<AppState>,
    Query(query): Query<CropLookupQuery>,
) -> ApiResult<Vec<String>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if query.crop.trim().is_empty() {
        return success(Vec::new(), revision_id);
    }

    match state.repo.find_crop_stage(&query.crop).await {
        Ok(found) => success(found.map(|c| c.stages).unwrap_or_default(), revision_id),
        Err(e) => error(e.during(Operation::Fetch), revision_id),
    }
}

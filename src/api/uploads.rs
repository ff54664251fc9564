//! Photo upload endpoint.

use axum::{
    body::Bytes,
    extract::{Query, State},
};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::errors::{AppError, Operation};
use crate::storage::StoredObject;
use crate::AppState;

/// Largest accepted photo body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

/// POST /api/uploads?filename= - Store the raw request body as a photo.
pub async fn upload_photo(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ApiResult<StoredObject> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let Some(filename) = query.filename.filter(|f| !f.trim().is_empty()) else {
        return error(
            AppError::Validation("filename is required".to_string()),
            revision_id,
        );
    };

    match state.storage.upload_photo(&filename, &body).await {
        Ok(stored) => success(stored, revision_id),
        Err(e) => error(e.during(Operation::Upload), revision_id),
    }
}

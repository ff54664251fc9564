//! Revision API endpoint.

use axum::extract::State;

use super::{success, with_revision, ApiResult};
use crate::models::RevisionInfo;
use crate::AppState;

/// GET /api/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let revision_info = state
        .repo
        .get_revision_info()
        .await
        .map_err(|e| with_revision(e, 0))?;

    success(revision_info.clone(), revision_info.revision_id)
}

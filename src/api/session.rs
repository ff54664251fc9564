//! Admin login and logout.

use axum::{extract::State, Extension, Json};

use super::{error, success, ApiResult};
use crate::auth::{verify_credentials, SessionContext};
use crate::errors::AppError;
use crate::models::{LoginRequest, SessionInfo};
use crate::AppState;

/// POST /api/session - Log in and open a session.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<SessionInfo> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let stored = match state.repo.get_admin_secret(request.username.trim()).await {
        Ok(stored) => stored,
        Err(e) => return error(e, revision_id),
    };

    if !verify_credentials(stored.as_deref(), &request.password) {
        tracing::warn!(username = %request.username, "Rejected login");
        return error(AppError::InvalidCredentials, revision_id);
    }

    let session = state.sessions.create(request.username.trim()).await;

    success(
        SessionInfo {
            token: session.token,
            username: session.username,
            created_at: session.created_at.to_rfc3339(),
        },
        revision_id,
    )
}

/// DELETE /api/session - Log out, destroying the caller's session.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    state.sessions.destroy(&session.token).await;
    success((), revision_id)
}

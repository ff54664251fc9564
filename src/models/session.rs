//! Admin login request and session payloads.

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/session`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Issued session returned to the client after a successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub token: String,
    pub username: String,
    pub created_at: String,
}

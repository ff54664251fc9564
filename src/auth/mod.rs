//! Admin sessions and credential checks.
//!
//! Implements constant-time comparison to mitigate timing attacks. Sessions are explicit:
//! created at login, destroyed at logout, and resolved per request from the bearer token.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

use crate::errors::{AppError, ErrorResponse};

/// Compared against when the username is unknown, so both failure paths do the same work.
const DUMMY_SECRET: &str = "farm-visits-no-such-user";

/// A logged-in admin.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Live sessions keyed by token.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionContext>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session for `username`.
    pub async fn create(&self, username: &str) -> SessionContext {
        let context = SessionContext {
            token: uuid::Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            created_at: Utc::now(),
        };

        self.sessions
            .write()
            .await
            .insert(context.token.clone(), context.clone());

        tracing::info!(username = %context.username, "Session created");
        context
    }

    pub async fn resolve(&self, token: &str) -> Option<SessionContext> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Close the session. Returns false if the token was not live.
    pub async fn destroy(&self, token: &str) -> bool {
        match self.sessions.write().await.remove(token) {
            Some(context) => {
                tracing::info!(username = %context.username, "Session destroyed");
                true
            }
            None => false,
        }
    }
}

/// Check a submitted secret against the stored one, if the user exists.
pub fn verify_credentials(stored: Option<&str>, provided: &str) -> bool {
    match stored {
        Some(expected) => constant_time_compare(provided, expected),
        None => {
            let _ = constant_time_compare(provided, DUMMY_SECRET);
            false
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Session gate for admin routes. Inserts the resolved `SessionContext` as a request extension.
pub async fn session_auth_layer(
    sessions: Arc<SessionRegistry>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()).map(|s| s.to_string()) else {
        return unauthorized_response("Missing session token");
    };

    match sessions.resolve(&token).await {
        Some(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        None => unauthorized_response("Session expired or invalid"),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // Constant-time comparison
    a_bytes.ct_eq(b_bytes).into()
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let error = AppError::Unauthorized(message.to_string());
    let body = ErrorResponse::new(&error, 0);

    (error.status_code(), Json(body)).into_response()
}

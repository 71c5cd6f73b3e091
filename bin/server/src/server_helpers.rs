//! Helper functions for server functions with proper error handling and logging.

use crate::auth::routes::SESSION_COOKIE;
use crate::auth::{AppState, ConsoleSession};
use crate::error::SessionError;
use axum::Extension;
use axum_extra::extract::CookieJar;
use ignitus_core::SessionId;
use std::sync::Arc;

/// Gets the shared application state attached to the request.
pub async fn app_state() -> Result<Arc<AppState>, SessionError> {
    let Extension(state): Extension<Arc<AppState>> =
        leptos_axum::extract().await.map_err(|e| {
            tracing::error!(error = %e, "Application state missing from request");
            SessionError::MissingState {
                details: e.to_string(),
            }
        })?;
    Ok(state)
}

/// Looks up the console session named by the request's session cookie.
///
/// Logs structured errors for debugging while returning user-safe error types.
pub async fn console_session(state: &AppState) -> Result<Arc<ConsoleSession>, SessionError> {
    let jar = leptos_axum::extract::<CookieJar>().await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to extract cookie jar");
        SessionError::NoSession
    })?;

    let value = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(SessionError::NoSession)?;

    let session_id: SessionId = value.parse().map_err(|_| {
        tracing::debug!(value = %value, "Malformed session cookie");
        SessionError::InvalidSessionId {
            value: value.clone(),
        }
    })?;

    state.registry.get(&session_id).ok_or_else(|| {
        tracing::debug!(session_id = %session_id, "Console session not found");
        SessionError::NotFound {
            session_id: session_id.to_string(),
        }
    })
}

//! Server functions deciding access to the console's protected views.

use crate::types::{AccessCheck, DenialNotice};
use leptos::prelude::*;

/// Re-checks the visitor's session and decides what a protected view may do.
///
/// A visitor without a console session is treated as signed out.
#[server]
pub async fn get_access() -> Result<AccessCheck, ServerFnError> {
    use crate::server_helpers::{app_state, console_session};
    use ignitus_platform_access::SessionState;

    let state = app_state().await.map_err(|e| e.into_server_error())?;

    let session_state = match console_session(&state).await {
        Ok(session) => {
            session
                .refresh(state.gate_config.settle_timeout())
                .await
        }
        Err(e) if e.is_signed_out() => {
            tracing::debug!(reason = %e, "No console session for access check");
            SessionState::unauthenticated()
        }
        Err(e) => return Err(e.into_server_error()),
    };

    let decision = state.guard.decide(&session_state);
    tracing::debug!(status = ?session_state.status(), ?decision, "Access decided");
    Ok(AccessCheck::new(decision, &session_state))
}

/// Explains a denial reason code. Unknown codes yield `None`.
#[server]
pub async fn explain_denial(reason: Option<String>) -> Result<Option<DenialNotice>, ServerFnError> {
    use ignitus_platform_access::DenyReason;

    Ok(reason
        .as_deref()
        .and_then(DenyReason::from_code)
        .map(DenialNotice::from))
}

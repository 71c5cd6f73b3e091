//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use ignitus_core::SessionId;
use ignitus_platform_access::Verdict;
use serde::Deserialize;
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::{AppState, oidc::AuthState, provider::Callback};

/// Console session cookie name.
pub const SESSION_COOKIE: &str = "console_session";

/// Auth state cookie name (for CSRF protection during OIDC flow).
const AUTH_STATE_COOKIE: &str = "auth_state";

/// Where an admitted administrator lands.
const ADMIN_HOME: &str = "/admin";

/// Query parameters for the OIDC callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Reads the console session id from the cookie jar.
pub fn session_id_from(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}

/// Initiates the OIDC login flow by redirecting to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let (session_id, _) = state.registry.get_or_create(session_id_from(&jar).as_ref());
    let (auth_url, auth_state) = state.authenticator.authorization_url();

    let auth_state_json = serde_json::to_string(&auth_state)
        .map_err(|e| AuthError::Internal(format!("failed to encode auth state: {}", e)))?;

    let secure = state.session_config.secure_cookies;
    let session_cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);

    let auth_state_cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    tracing::debug!(session_id = %session_id, "redirecting to identity provider");
    Ok((
        jar.add(session_cookie).add(auth_state_cookie),
        Redirect::to(&auth_url),
    ))
}

/// Handles the OIDC callback and runs the console's access decision.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let session = session_id_from(&jar)
        .and_then(|id| state.registry.get(&id))
        .ok_or(AuthError::NoSession)?;

    let callback = match query.error {
        Some(error) => Callback::Error {
            error,
            description: query.error_description,
        },
        None => {
            let auth_state_cookie = jar
                .get(AUTH_STATE_COOKIE)
                .ok_or(AuthError::MissingAuthState)?;
            let auth_state: AuthState = serde_json::from_str(auth_state_cookie.value())
                .map_err(|_| AuthError::InvalidAuthState)?;

            let (Some(code), Some(returned_state)) = (query.code, query.state) else {
                return Err(AuthError::MissingCode);
            };
            if returned_state != auth_state.csrf_token {
                return Err(AuthError::CsrfMismatch);
            }
            Callback::Code {
                code,
                state: auth_state,
            }
        }
    };

    session.provider().stage_callback(callback);

    let target = match session.gate().sign_in_interactive().await {
        Ok(Verdict::Admit) => ADMIN_HOME.to_string(),
        Ok(Verdict::Deny(reason)) => state.guard.unauthorized_target(Some(reason)),
        Err(report) => {
            tracing::warn!(error = ?report, "interactive sign-in did not complete");
            return Err(AuthError::SignInInterrupted);
        }
    };

    let remove_auth_state = Cookie::build((AUTH_STATE_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    Ok((jar.add(remove_auth_state), Redirect::to(&target)))
}

/// Signs the browser out and forgets its console session.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session) = session_id_from(&jar).and_then(|id| state.registry.remove(&id)) {
        session.gate().sign_out().await;
    }

    let remove_session = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    (jar.add(remove_session), Redirect::to("/"))
}

/// Authentication errors.
#[derive(Debug)]
pub enum AuthError {
    NoSession,
    MissingAuthState,
    InvalidAuthState,
    MissingCode,
    CsrfMismatch,
    SignInInterrupted,
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NoSession | Self::SignInInterrupted => {
                return Redirect::to("/login").into_response();
            }
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state"),
            Self::InvalidAuthState => (StatusCode::BAD_REQUEST, "Invalid auth state"),
            Self::MissingCode => (StatusCode::BAD_REQUEST, "Missing authorization code"),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch"),
            Self::Internal(msg) => {
                tracing::error!("Authentication error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::tests::FakeAuthenticator;
    use crate::auth::registry::tests::{MapDirectory, registry};
    use crate::config::SessionConfig;
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
        routing::get,
    };
    use ignitus_platform_access::{DirectoryRecord, GateConfig, Role};
    use tower::ServiceExt;

    fn app_state(directory: Arc<MapDirectory>) -> Arc<AppState> {
        Arc::new(AppState::new(
            registry(directory),
            Arc::new(FakeAuthenticator),
            GateConfig::new("a@x.com"),
            SessionConfig::default(),
        ))
    }

    fn router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/auth/login", get(login))
            .route("/auth/callback", get(callback))
            .route("/auth/logout", get(logout))
            .with_state(state)
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// Collects `Set-Cookie` values into a `Cookie` request header.
    fn cookies(response: &Response) -> String {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .collect::<Vec<_>>()
            .join("; ")
    }

    async fn send(state: &Arc<AppState>, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        router(state.clone())
            .oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    #[tokio::test]
    async fn login_redirects_to_provider_with_cookies() {
        let state = app_state(Arc::new(MapDirectory::default()));

        let response = send(&state, "/auth/login", None).await;

        assert!(response.status().is_redirection());
        assert_eq!(
            location(&response),
            "https://accounts.example.com/authorize?state=csrf-1"
        );
        let cookies = cookies(&response);
        assert!(cookies.contains("console_session=sess_"));
        assert!(cookies.contains("auth_state="));
        assert_eq!(state.registry.len(), 1);
    }

    #[tokio::test]
    async fn admitted_admin_lands_on_dashboard() {
        let directory = Arc::new(MapDirectory::default());
        directory.insert(DirectoryRecord::new("uid-a", Role::Admin, false));
        let state = app_state(directory);

        let login = send(&state, "/auth/login", None).await;
        let cookie = cookies(&login);
        let response = send(
            &state,
            "/auth/callback?code=ok:uid-a:a%40x.com&state=csrf-1",
            Some(&cookie),
        )
        .await;

        assert_eq!(location(&response), "/admin");
    }

    #[tokio::test]
    async fn denied_sign_in_redirects_with_reason() {
        let state = app_state(Arc::new(MapDirectory::default()));

        let login = send(&state, "/auth/login", None).await;
        let cookie = cookies(&login);
        let response = send(
            &state,
            "/auth/callback?code=ok:uid-a:a%40x.com&state=csrf-1",
            Some(&cookie),
        )
        .await;

        assert_eq!(
            location(&response),
            "/unauthorized?reason=no_directory_record"
        );
    }

    #[tokio::test]
    async fn provider_error_is_reported_as_denial() {
        let state = app_state(Arc::new(MapDirectory::default()));

        let login = send(&state, "/auth/login", None).await;
        let cookie = cookies(&login);
        let response = send(
            &state,
            "/auth/callback?error=access_denied",
            Some(&cookie),
        )
        .await;

        assert_eq!(
            location(&response),
            "/unauthorized?reason=provider_sign_in_failed"
        );
    }

    #[tokio::test]
    async fn callback_rejects_csrf_mismatch() {
        let state = app_state(Arc::new(MapDirectory::default()));

        let login = send(&state, "/auth/login", None).await;
        let cookie = cookies(&login);
        let response = send(
            &state,
            "/auth/callback?code=ok:uid-a:a%40x.com&state=forged",
            Some(&cookie),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn callback_without_session_restarts_login() {
        let state = app_state(Arc::new(MapDirectory::default()));

        let response = send(&state, "/auth/callback?code=x&state=csrf-1", None).await;

        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn logout_forgets_session() {
        let directory = Arc::new(MapDirectory::default());
        directory.insert(DirectoryRecord::new("uid-a", Role::Admin, false));
        let state = app_state(directory);

        let login = send(&state, "/auth/login", None).await;
        let cookie = cookies(&login);
        send(
            &state,
            "/auth/callback?code=ok:uid-a:a%40x.com&state=csrf-1",
            Some(&cookie),
        )
        .await;

        let response = send(&state, "/auth/logout", Some(&cookie)).await;

        assert_eq!(location(&response), "/");
        assert!(state.registry.is_empty());
        assert!(cookies(&response).contains("console_session="));
    }
}

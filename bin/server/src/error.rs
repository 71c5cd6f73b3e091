//! Domain error types for server functions.

use leptos::server_fn::error::ServerFnError;
use std::fmt;

/// Console session lookup errors.
#[derive(Debug)]
pub enum SessionError {
    /// The browser sent no session cookie.
    NoSession,
    /// The session cookie does not hold a session id.
    InvalidSessionId { value: String },
    /// The session expired or never existed.
    NotFound { session_id: String },
    /// Application state was not attached to the request.
    MissingState { details: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSession => write!(f, "no console session"),
            Self::InvalidSessionId { value } => {
                write!(f, "invalid session id '{}'", value)
            }
            Self::NotFound { session_id } => {
                write!(f, "session '{}' not found", session_id)
            }
            Self::MissingState { details } => {
                write!(f, "application state unavailable: {}", details)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// Returns true when the visitor simply is not signed in.
    #[must_use]
    pub fn is_signed_out(&self) -> bool {
        matches!(
            self,
            Self::NoSession | Self::InvalidSessionId { .. } | Self::NotFound { .. }
        )
    }

    /// Convert to a user-safe ServerFnError.
    pub fn into_server_error(self) -> ServerFnError {
        match &self {
            SessionError::NoSession => ServerFnError::new("Not signed in"),
            SessionError::InvalidSessionId { .. } => ServerFnError::new("Invalid session"),
            SessionError::NotFound { .. } => ServerFnError::new("Session expired"),
            SessionError::MissingState { .. } => ServerFnError::new("Internal server error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_out_errors_are_distinguished_from_faults() {
        assert!(SessionError::NoSession.is_signed_out());
        assert!(
            SessionError::NotFound {
                session_id: "sess_x".to_string()
            }
            .is_signed_out()
        );
        assert!(
            !SessionError::MissingState {
                details: "no extension".to_string()
            }
            .is_signed_out()
        );
    }

    #[test]
    fn server_errors_do_not_leak_details() {
        let err = SessionError::InvalidSessionId {
            value: "garbage".to_string(),
        }
        .into_server_error();
        assert!(!err.to_string().contains("garbage"));
    }
}

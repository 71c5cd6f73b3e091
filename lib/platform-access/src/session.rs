//! Console session state.
//!
//! A `SessionState` starts `Unauthenticated` and is only ever replaced by the
//! [`SessionGate`](crate::SessionGate). Everyone else watches it through a
//! read-only [`SessionView`].
//!
//! The constructors are the only way to build a state, and only
//! [`SessionState::authorized`] produces `Authorized`, which the gate calls
//! after the policy admitted the identity and record it is given.

use crate::directory::DirectoryRecord;
use crate::identity::IdentityAssertion;
use crate::policy::DenyReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Lifecycle status of a console session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Nobody is signed in.
    Unauthenticated,
    /// A verdict is being computed; render a loading indicator only.
    Authenticating,
    /// An admitted administrator is signed in.
    Authorized,
    /// The last attempt was refused.
    Denied,
}

/// Snapshot of the console session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    status: SessionStatus,
    identity: Option<IdentityAssertion>,
    record: Option<DirectoryRecord>,
    last_error: Option<DenyReason>,
    authorized_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Nobody signed in.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            identity: None,
            record: None,
            last_error: None,
            authorized_at: None,
        }
    }

    /// Verdict pending.
    #[must_use]
    pub fn authenticating() -> Self {
        Self {
            status: SessionStatus::Authenticating,
            ..Self::unauthenticated()
        }
    }

    /// Admitted administrator.
    #[must_use]
    pub fn authorized(identity: IdentityAssertion, record: DirectoryRecord) -> Self {
        Self {
            status: SessionStatus::Authorized,
            identity: Some(identity),
            record: Some(record),
            last_error: None,
            authorized_at: Some(Utc::now()),
        }
    }

    /// Refused attempt. Identity and record are not retained.
    #[must_use]
    pub fn denied(reason: DenyReason) -> Self {
        Self {
            status: SessionStatus::Denied,
            last_error: Some(reason),
            ..Self::unauthenticated()
        }
    }

    /// Returns the session status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns the signed-in identity, present only while authorized.
    #[must_use]
    pub fn identity(&self) -> Option<&IdentityAssertion> {
        self.identity.as_ref()
    }

    /// Returns the directory record, present only while authorized.
    #[must_use]
    pub fn record(&self) -> Option<&DirectoryRecord> {
        self.record.as_ref()
    }

    /// Returns why the last attempt was refused.
    #[must_use]
    pub fn last_error(&self) -> Option<DenyReason> {
        self.last_error
    }

    /// Returns when the session became authorized.
    #[must_use]
    pub fn authorized_at(&self) -> Option<DateTime<Utc>> {
        self.authorized_at
    }

    /// Returns true if protected views may render.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.status == SessionStatus::Authorized
    }

    /// Returns true while a verdict is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == SessionStatus::Authenticating
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::unauthenticated()
    }
}

/// Read-only observer of the gate's session state.
#[derive(Debug, Clone)]
pub struct SessionView {
    rx: watch::Receiver<SessionState>,
}

impl SessionView {
    pub(crate) fn new(rx: watch::Receiver<SessionState>) -> Self {
        Self { rx }
    }

    /// Returns the latest state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Waits for the next state change. Returns false once the gate is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits until no verdict is pending and returns that state.
    pub async fn settled(&mut self) -> SessionState {
        if let Ok(state) = self.rx.wait_for(|s| !s.is_pending()).await {
            return state.clone();
        }
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn admin() -> (IdentityAssertion, DirectoryRecord) {
        (
            IdentityAssertion::new("uid-a", "a@x.com", "A"),
            DirectoryRecord::new("uid-a", Role::Admin, false),
        )
    }

    #[test]
    fn default_state_is_unauthenticated() {
        let state = SessionState::default();
        assert_eq!(state.status(), SessionStatus::Unauthenticated);
        assert!(state.identity().is_none());
        assert!(state.record().is_none());
        assert!(state.last_error().is_none());
    }

    #[test]
    fn authorized_state_retains_identity_and_record() {
        let (identity, record) = admin();
        let before = Utc::now();
        let state = SessionState::authorized(identity.clone(), record.clone());

        assert!(state.is_authorized());
        assert_eq!(state.identity(), Some(&identity));
        assert_eq!(state.record(), Some(&record));
        assert!(state.authorized_at().is_some_and(|at| at >= before));
    }

    #[test]
    fn denied_state_drops_identity_and_keeps_reason() {
        let state = SessionState::denied(DenyReason::Blocked);
        assert_eq!(state.status(), SessionStatus::Denied);
        assert!(state.identity().is_none());
        assert!(state.record().is_none());
        assert_eq!(state.last_error(), Some(DenyReason::Blocked));
    }

    #[test]
    fn authorized_state_serializes_for_observers() {
        let (identity, record) = admin();
        let json = serde_json::to_value(SessionState::authorized(identity, record))
            .expect("serialize");

        assert_eq!(json["status"], "authorized");
        assert_eq!(json["identity"]["email"], "a@x.com");
    }

    #[test]
    fn authenticating_state_is_pending_and_empty() {
        let state = SessionState::authenticating();
        assert!(state.is_pending());
        assert!(!state.is_authorized());
        assert!(state.identity().is_none());
    }

    #[tokio::test]
    async fn view_settles_once_verdict_lands() {
        let (tx, rx) = watch::channel(SessionState::authenticating());
        let mut view = SessionView::new(rx);

        let waiter = tokio::spawn(async move { view.settled().await });
        tx.send_replace(SessionState::denied(DenyReason::NotWhitelisted));

        let settled = waiter.await.expect("join");
        assert_eq!(settled.status(), SessionStatus::Denied);
    }

    #[tokio::test]
    async fn view_reports_closed_gate() {
        let (tx, rx) = watch::channel(SessionState::unauthenticated());
        let mut view = SessionView::new(rx);
        drop(tx);
        assert!(!view.changed().await);
        assert_eq!(view.settled().await.status(), SessionStatus::Unauthenticated);
    }
}

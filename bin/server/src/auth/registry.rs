//! In-memory registry of console sessions, one per browser.
//!
//! Each browser gets its own [`SessionGate`] wired to its own
//! [`BrowserProvider`], with a restore subscription running for as long as the
//! session lives. Sessions idle past the configured limit are discarded.

use super::provider::{Authenticator, BrowserProvider};
use ignitus_core::SessionId;
use ignitus_platform_access::{
    AllowList, DirectoryStore, RestoreHandle, SessionGate, SessionState,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// One browser's console session.
pub struct ConsoleSession {
    gate: Arc<SessionGate>,
    provider: Arc<BrowserProvider>,
    _restore: RestoreHandle,
    last_seen: Mutex<Instant>,
}

impl ConsoleSession {
    fn start(
        authenticator: Arc<dyn Authenticator>,
        directory: Arc<dyn DirectoryStore>,
        allow_list: AllowList,
    ) -> Self {
        let provider = Arc::new(BrowserProvider::new(authenticator));
        let gate = Arc::new(SessionGate::new(provider.clone(), directory, allow_list));
        let restore = gate.restore_session();
        Self {
            gate,
            provider,
            _restore: restore,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn gate(&self) -> &Arc<SessionGate> {
        &self.gate
    }

    pub fn provider(&self) -> &BrowserProvider {
        &self.provider
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_at(&self, now: Instant) -> Duration {
        let last_seen = *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);
        now.saturating_duration_since(last_seen)
    }

    /// Re-checks the provider session against the directory and returns the
    /// settled state.
    ///
    /// A re-check already in flight is awaited rather than restarted, so
    /// repeated page loads cannot keep abandoning a slow directory read.
    ///
    /// Gives up waiting after `timeout`, in which case the returned state may
    /// still be pending.
    pub async fn refresh(&self, timeout: Duration) -> SessionState {
        let mut view = self.gate.view();
        let in_flight = view.current().is_pending();
        if !in_flight && !self.provider.announce() {
            return view.current();
        }

        let settled = tokio::time::timeout(timeout, async {
            if !in_flight {
                view.changed().await;
            }
            view.settled().await
        })
        .await;
        match settled {
            Ok(state) => state,
            Err(_) => {
                tracing::warn!(?timeout, in_flight, "access check did not settle in time");
                view.current()
            }
        }
    }
}

/// All live console sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<ConsoleSession>>>,
    authenticator: Arc<dyn Authenticator>,
    directory: Arc<dyn DirectoryStore>,
    allow_list: AllowList,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        directory: Arc<dyn DirectoryStore>,
        allow_list: AllowList,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            authenticator,
            directory,
            allow_list,
            idle_timeout,
        }
    }

    /// Looks up a live session and marks it active.
    pub fn get(&self, id: &SessionId) -> Option<Arc<ConsoleSession>> {
        let session = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()?;

        if session.idle_at(Instant::now()) >= self.idle_timeout {
            tracing::debug!(session_id = %id, "console session idled out");
            self.remove(id);
            return None;
        }
        session.touch();
        Some(session)
    }

    /// Returns the live session for `id`, or starts a new one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn get_or_create(&self, id: Option<&SessionId>) -> (SessionId, Arc<ConsoleSession>) {
        if let Some(live) = id.and_then(|id| self.get(id).map(|session| (*id, session))) {
            return live;
        }

        let id = SessionId::new();
        let session = Arc::new(ConsoleSession::start(
            self.authenticator.clone(),
            self.directory.clone(),
            self.allow_list.clone(),
        ));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, session.clone());
        tracing::debug!(session_id = %id, "console session started");
        (id, session)
    }

    /// Forgets a session. Its restore subscription stops once the last
    /// reference is dropped.
    pub fn remove(&self, id: &SessionId) -> Option<Arc<ConsoleSession>> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Discards sessions idle past the limit. Returns how many were removed.
    pub fn purge_idle(&self) -> usize {
        self.purge_idle_at(Instant::now())
    }

    fn purge_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| session.idle_at(now) < self.idle_timeout);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::provider::Callback;
    use crate::auth::provider::tests::FakeAuthenticator;
    use async_trait::async_trait;
    use ignitus_core::SubjectId;
    use ignitus_platform_access::{
        DenyReason, DirectoryError, DirectoryRecord, Role, SessionStatus, Verdict,
    };
    use rootcause::prelude::Report;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Directory whose records can change between reads.
    #[derive(Default)]
    pub(crate) struct MapDirectory {
        records: Mutex<HashMap<SubjectId, DirectoryRecord>>,
    }

    impl MapDirectory {
        pub(crate) fn insert(&self, record: DirectoryRecord) {
            self.records
                .lock()
                .expect("records")
                .insert(record.subject_id.clone(), record);
        }
    }

    #[async_trait]
    impl DirectoryStore for MapDirectory {
        async fn get(
            &self,
            subject: &SubjectId,
        ) -> Result<Option<DirectoryRecord>, Report<DirectoryError>> {
            Ok(self.records.lock().expect("records").get(subject).cloned())
        }
    }

    /// Directory whose reads take `delay`, counting reads started.
    struct SlowDirectory {
        inner: MapDirectory,
        delay: Duration,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl DirectoryStore for SlowDirectory {
        async fn get(
            &self,
            subject: &SubjectId,
        ) -> Result<Option<DirectoryRecord>, Report<DirectoryError>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.inner.get(subject).await
        }
    }

    pub(crate) fn registry(directory: Arc<MapDirectory>) -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(FakeAuthenticator),
            directory,
            AllowList::new(["a@x.com"]),
            Duration::from_secs(60),
        )
    }

    fn stage(session: &ConsoleSession, code: &str) {
        session.provider().stage_callback(Callback::Code {
            code: code.to_string(),
            state: FakeAuthenticator.authorization_url().1,
        });
    }

    #[tokio::test]
    async fn get_or_create_reuses_live_sessions() {
        let registry = registry(Arc::new(MapDirectory::default()));

        let (id, first) = registry.get_or_create(None);
        let (same_id, second) = registry.get_or_create(Some(&id));
        assert_eq!(id, same_id);
        assert!(Arc::ptr_eq(&first, &second));

        let (other, _) = registry.get_or_create(Some(&SessionId::new()));
        assert_ne!(other, id);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn idle_sessions_are_purged() {
        let registry = registry(Arc::new(MapDirectory::default()));
        let (id, _) = registry.get_or_create(None);

        assert_eq!(registry.purge_idle_at(Instant::now()), 0);
        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(registry.purge_idle_at(later), 1);
        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn refresh_revokes_blocked_admin() {
        let directory = Arc::new(MapDirectory::default());
        directory.insert(DirectoryRecord::new("uid-a", Role::Admin, false));
        let registry = registry(directory.clone());
        let (_, session) = registry.get_or_create(None);

        stage(&session, "ok:uid-a:a@x.com");
        let verdict = session.gate().sign_in_interactive().await.expect("sign in");
        assert_eq!(verdict, Verdict::Admit);

        let state = session.refresh(Duration::from_secs(2)).await;
        assert_eq!(state.status(), SessionStatus::Authorized);

        directory.insert(DirectoryRecord::new("uid-a", Role::Admin, true));
        let state = session.refresh(Duration::from_secs(2)).await;
        assert_eq!(state.status(), SessionStatus::Denied);
        assert_eq!(state.last_error(), Some(DenyReason::Blocked));
    }

    #[tokio::test]
    async fn repeated_refresh_lets_slow_directory_read_finish() {
        let directory = Arc::new(SlowDirectory {
            inner: MapDirectory::default(),
            delay: Duration::from_millis(300),
            reads: AtomicUsize::new(0),
        });
        directory
            .inner
            .insert(DirectoryRecord::new("uid-a", Role::Admin, false));
        let registry = SessionRegistry::new(
            Arc::new(FakeAuthenticator),
            directory.clone(),
            AllowList::new(["a@x.com"]),
            Duration::from_secs(60),
        );
        let (_, session) = registry.get_or_create(None);

        stage(&session, "ok:uid-a:a@x.com");
        let verdict = session.gate().sign_in_interactive().await.expect("sign in");
        assert_eq!(verdict, Verdict::Admit);
        assert_eq!(directory.reads.load(Ordering::SeqCst), 1);

        let mut statuses = Vec::new();
        for _ in 0..10 {
            let state = session.refresh(Duration::from_millis(100)).await;
            statuses.push(state.status());
            if !state.is_pending() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(statuses.last(), Some(&SessionStatus::Authorized));
        assert!(statuses.len() > 1, "first refresh should time out while reading");
        assert_eq!(directory.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_without_provider_session_is_immediate() {
        let registry = registry(Arc::new(MapDirectory::default()));
        let (_, session) = registry.get_or_create(None);

        let state = session.refresh(Duration::from_secs(2)).await;
        assert_eq!(state, SessionState::unauthenticated());
    }
}

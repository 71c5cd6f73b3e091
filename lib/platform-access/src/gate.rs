//! Session gate.
//!
//! Drives a sign-in attempt end to end and owns the console's
//! [`SessionState`]:
//!
//! ```text
//! Unauthenticated --sign_in_interactive--> Authenticating
//! Authenticating  --Admit-->               Authorized
//! Authenticating  --Deny(*)-->             Denied
//! Authorized      --provider sign-out / sign_out--> Unauthenticated
//! Authorized      --restored session re-checked, Deny--> Denied
//! Denied          --sign_out / sign_in_interactive--> Unauthenticated / Authenticating
//! ```
//!
//! Every state replacement advances a generation counter under the watch
//! channel's write lock. An evaluation remembers the generation it started
//! from and its verdict is committed only if nothing replaced the state in
//! the meantime, so a slow directory read can never resurrect a session that
//! was signed out while it was pending.

use crate::allow_list::AllowList;
use crate::directory::{DirectoryRecord, DirectoryStore};
use crate::error::GateError;
use crate::identity::{IdentityAssertion, IdentityProvider, ProviderSubscription};
use crate::policy::{self, DenyReason, Verdict};
use crate::session::{SessionState, SessionStatus, SessionView};
use ignitus_core::SubjectId;
use rootcause::prelude::Report;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Result of checking one identity against the directory and policy.
enum Evaluation {
    Admit(DirectoryRecord),
    Deny(DenyReason),
}

/// Orchestrates authentication and holds the only writer of the session state.
pub struct SessionGate {
    provider: Arc<dyn IdentityProvider>,
    directory: Arc<dyn DirectoryStore>,
    allow_list: AllowList,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
    sign_in: Mutex<()>,
}

impl SessionGate {
    /// Creates a gate in the `Unauthenticated` state.
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        directory: Arc<dyn DirectoryStore>,
        allow_list: AllowList,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::unauthenticated());
        Self {
            provider,
            directory,
            allow_list,
            state,
            generation: AtomicU64::new(0),
            sign_in: Mutex::new(()),
        }
    }

    /// Returns a read-only observer of the session state.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView::new(self.state.subscribe())
    }

    /// Returns the current session state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Returns the allow-list this gate enforces.
    #[must_use]
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Runs the interactive sign-in flow and returns the verdict for display.
    ///
    /// # Errors
    ///
    /// - [`GateError::SignInInProgress`] if another interactive sign-in has
    ///   not finished; the state is left untouched.
    /// - [`GateError::Superseded`] if a sign-out or provider notification
    ///   replaced the attempt before its verdict was committed.
    #[instrument(skip(self))]
    pub async fn sign_in_interactive(&self) -> Result<Verdict, Report<GateError>> {
        let Ok(_in_flight) = self.sign_in.try_lock() else {
            debug!("rejecting overlapping interactive sign-in");
            return Err(GateError::SignInInProgress.into());
        };

        let generation = self.advance(SessionState::authenticating());

        let identity = match self.provider.sign_in().await {
            Ok(identity) => identity,
            Err(report) => {
                warn!(error = ?report, "identity provider sign-in failed");
                let reason = DenyReason::ProviderSignInFailed;
                if !self.commit(generation, SessionState::denied(reason)) {
                    return Err(GateError::Superseded.into());
                }
                return Ok(Verdict::Deny(reason));
            }
        };

        let subject = identity.subject_id.clone();
        let evaluation = self.evaluate(&identity).await;
        let (verdict, committed) = self.settle(generation, identity, evaluation);

        // A refused identity must not keep a provider session, even when a
        // newer event already took over the console state. A newer re-check
        // that authorized the same subject wins over this stale denial.
        if !verdict.is_admit() && !self.authorizes(&subject) {
            self.end_provider_session().await;
        }

        if committed {
            Ok(verdict)
        } else {
            Err(GateError::Superseded.into())
        }
    }

    /// Subscribes to provider session changes and re-checks every restored
    /// session against the directory.
    ///
    /// Events are processed strictly in delivery order. A directory read
    /// still pending when the next event arrives is abandoned.
    pub fn restore_session(self: &Arc<Self>) -> RestoreHandle {
        let subscription = self.provider.subscribe();
        let gate = Arc::clone(self);
        let task = tokio::spawn(async move { gate.run_restore(subscription).await });
        RestoreHandle { task }
    }

    /// Ends the provider session and resets to `Unauthenticated`.
    ///
    /// Safe to call repeatedly.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        self.advance(SessionState::unauthenticated());
        self.end_provider_session().await;
        info!("session signed out");
    }

    async fn run_restore(&self, mut subscription: ProviderSubscription) {
        let mut next = subscription.recv().await;

        while let Some(event) = next.take() {
            next = match event.identity {
                None => {
                    self.provider_signed_out();
                    subscription.recv().await
                }
                Some(identity) => {
                    let generation = self.advance(SessionState::authenticating());
                    tokio::select! {
                        biased;
                        newer = subscription.recv() => {
                            debug!(
                                subject = %identity.subject_id,
                                "directory read abandoned for newer provider event"
                            );
                            newer
                        }
                        evaluation = self.evaluate(&identity) => {
                            let (verdict, committed) = self.settle(generation, identity, evaluation);
                            if committed && !verdict.is_admit() {
                                self.end_provider_session().await;
                            }
                            subscription.recv().await
                        }
                    }
                }
            };
        }

        debug!("provider subscription closed");
    }

    async fn evaluate(&self, identity: &IdentityAssertion) -> Evaluation {
        let record = match self.directory.get(&identity.subject_id).await {
            Ok(record) => record,
            Err(report) => {
                warn!(
                    subject = %identity.subject_id,
                    error = ?report,
                    "directory read failed"
                );
                return Evaluation::Deny(DenyReason::DirectoryUnavailable);
            }
        };

        match (policy::decide(identity, record.as_ref(), &self.allow_list), record) {
            (Verdict::Admit, Some(record)) => Evaluation::Admit(record),
            (Verdict::Deny(reason), _) => Evaluation::Deny(reason),
            (Verdict::Admit, None) => Evaluation::Deny(DenyReason::NoDirectoryRecord),
        }
    }

    /// Commits an evaluation if it is still current.
    fn settle(
        &self,
        generation: u64,
        identity: IdentityAssertion,
        evaluation: Evaluation,
    ) -> (Verdict, bool) {
        let subject = identity.subject_id.clone();
        match evaluation {
            Evaluation::Admit(record) => {
                let committed =
                    self.commit(generation, SessionState::authorized(identity, record));
                if committed {
                    info!(subject = %subject, "session authorized");
                } else {
                    debug!(subject = %subject, "stale admit discarded");
                }
                (Verdict::Admit, committed)
            }
            Evaluation::Deny(reason) => {
                let committed = self.commit(generation, SessionState::denied(reason));
                info!(subject = %subject, reason = %reason, committed, "session denied");
                (Verdict::Deny(reason), committed)
            }
        }
    }

    fn authorizes(&self, subject: &SubjectId) -> bool {
        let state = self.state.borrow();
        state.is_authorized()
            && state
                .identity()
                .is_some_and(|identity| &identity.subject_id == subject)
    }

    async fn end_provider_session(&self) {
        if let Err(report) = self.provider.sign_out().await {
            warn!(error = ?report, "provider sign-out failed");
        }
    }

    /// Replaces the state unconditionally and returns the new generation.
    fn advance(&self, next: SessionState) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = next;
        });
        generation
    }

    /// Replaces the state only if `generation` is still the latest.
    fn commit(&self, generation: u64, next: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            true
        })
    }

    /// The provider session ended. A denied session keeps its reason; its
    /// identity is already gone.
    fn provider_signed_out(&self) {
        self.state.send_if_modified(|state| {
            if state.status() == SessionStatus::Denied {
                return false;
            }
            self.generation.fetch_add(1, Ordering::SeqCst);
            let changed = state.status() != SessionStatus::Unauthenticated;
            *state = SessionState::unauthenticated();
            changed
        });
    }
}

/// Keeps the restore task alive. Dropping it unsubscribes.
#[derive(Debug)]
pub struct RestoreHandle {
    task: JoinHandle<()>,
}

impl RestoreHandle {
    /// Stops processing provider events and detaches from the provider.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Returns true once the restore task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RestoreHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

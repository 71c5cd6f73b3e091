//! In-memory adapters for exercising the gate without a network.

use crate::directory::{DirectoryRecord, DirectoryStore};
use crate::error::{DirectoryError, IdentityProviderError};
use crate::identity::{
    IdentityAssertion, IdentityProvider, ProviderEvent, ProviderSessionHub, ProviderSubscription,
};
use crate::session::{SessionStatus, SessionView};
use async_trait::async_trait;
use ignitus_core::SubjectId;
use rootcause::prelude::Report;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

const WAIT_LIMIT: Duration = Duration::from_secs(2);

/// Identity provider with scripted sign-in outcomes.
///
/// `sign_out` notifies subscribers the way a real provider does.
#[derive(Default)]
pub(crate) struct FakeProvider {
    hub: ProviderSessionHub,
    outcomes: Mutex<VecDeque<Result<IdentityAssertion, IdentityProviderError>>>,
    sign_in_latch: Option<Arc<Semaphore>>,
    sign_outs: AtomicUsize,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes every `sign_in` wait for [`FakeProvider::release_sign_in`].
    pub(crate) fn with_sign_in_latch(mut self) -> Self {
        self.sign_in_latch = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub(crate) fn push_sign_in(&self, outcome: Result<IdentityAssertion, IdentityProviderError>) {
        self.outcomes.lock().expect("outcomes").push_back(outcome);
    }

    pub(crate) fn release_sign_in(&self) {
        if let Some(latch) = &self.sign_in_latch {
            latch.add_permits(1);
        }
    }

    pub(crate) fn emit(&self, event: ProviderEvent) {
        self.hub.notify(event);
    }

    pub(crate) fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn sign_in(&self) -> Result<IdentityAssertion, Report<IdentityProviderError>> {
        if let Some(latch) = &self.sign_in_latch {
            latch.acquire().await.expect("latch open").forget();
        }
        let outcome = self.outcomes.lock().expect("outcomes").pop_front();
        match outcome {
            Some(Ok(identity)) => Ok(identity),
            Some(Err(err)) => Err(err.into()),
            None => Err(IdentityProviderError::Cancelled.into()),
        }
    }

    async fn sign_out(&self) -> Result<(), Report<IdentityProviderError>> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.hub.notify(ProviderEvent::signed_out());
        Ok(())
    }

    fn subscribe(&self) -> ProviderSubscription {
        self.hub.subscribe()
    }
}

/// Directory backed by a map, with failure injection and gated reads.
#[derive(Default)]
pub(crate) struct FakeDirectory {
    records: Mutex<HashMap<SubjectId, DirectoryRecord>>,
    failing: AtomicBool,
    read_latch: Option<Arc<Semaphore>>,
    numbered_reads: Option<Mutex<Vec<Arc<Semaphore>>>>,
    started: AtomicUsize,
    completed: AtomicUsize,
}

impl FakeDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes every read wait for [`FakeDirectory::release_read`].
    pub(crate) fn with_read_latch(mut self) -> Self {
        self.read_latch = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Makes read `n` (counting from zero) wait for
    /// [`FakeDirectory::release_read_number`], so reads can finish out of
    /// order.
    pub(crate) fn with_numbered_reads(mut self) -> Self {
        self.numbered_reads = Some(Mutex::new(Vec::new()));
        self
    }

    pub(crate) fn insert(&self, record: DirectoryRecord) {
        self.records
            .lock()
            .expect("records")
            .insert(record.subject_id.clone(), record);
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn release_read(&self) {
        if let Some(latch) = &self.read_latch {
            latch.add_permits(1);
        }
    }

    pub(crate) fn release_read_number(&self, index: usize) {
        if let Some(gate) = self.read_gate(index) {
            gate.add_permits(1);
        }
    }

    fn read_gate(&self, index: usize) -> Option<Arc<Semaphore>> {
        let mut gates = self.numbered_reads.as_ref()?.lock().expect("read gates");
        while gates.len() <= index {
            gates.push(Arc::new(Semaphore::new(0)));
        }
        Some(gates[index].clone())
    }

    pub(crate) fn started_reads(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn completed_reads(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryStore for FakeDirectory {
    async fn get(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<DirectoryRecord>, Report<DirectoryError>> {
        let index = self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(latch) = &self.read_latch {
            latch.acquire().await.expect("latch open").forget();
        }
        if let Some(gate) = self.read_gate(index) {
            gate.acquire().await.expect("read gate open").forget();
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(DirectoryError::Transport {
                reason: "connection reset".to_string(),
            }
            .into());
        }
        Ok(self.records.lock().expect("records").get(subject).cloned())
    }
}

/// Waits until the view reports `status`.
pub(crate) async fn wait_for_status(view: &mut SessionView, status: SessionStatus) {
    tokio::time::timeout(WAIT_LIMIT, async {
        while view.current().status() != status {
            assert!(view.changed().await, "gate dropped while waiting for {status:?}");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {status:?}"));
}

/// Polls `condition` until it holds.
pub(crate) async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(WAIT_LIMIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition never held");
}

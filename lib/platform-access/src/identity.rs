//! Identity provider seam.
//!
//! The console never talks to a federated sign-in service directly. An
//! [`IdentityProvider`] adapter runs the interactive flow, ends provider-level
//! sessions, and announces session changes through an ordered subscription.
//!
//! ```text
//! adapter ──notify──► ProviderSessionHub ──mpsc──► ProviderSubscription ──► SessionGate
//! ```

use crate::error::IdentityProviderError;
use async_trait::async_trait;
use ignitus_core::SubjectId;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// Verified identity returned by a successful federated sign-in.
///
/// Held only for the duration of a sign-in attempt, or for as long as the
/// session it produced stays authorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityAssertion {
    /// Provider-assigned subject identifier.
    pub subject_id: SubjectId,
    /// Email address asserted by the provider.
    pub email: String,
    /// Human-readable name.
    pub display_name: String,
}

impl IdentityAssertion {
    /// Creates a new assertion.
    #[must_use]
    pub fn new(
        subject_id: impl Into<SubjectId>,
        email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
            display_name: display_name.into(),
        }
    }
}

/// A provider-level session change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEvent {
    /// The identity now signed in at the provider, or `None` once signed out.
    pub identity: Option<IdentityAssertion>,
}

impl ProviderEvent {
    /// A prior session was found (for example on page load).
    #[must_use]
    pub fn signed_in(identity: IdentityAssertion) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// The provider session ended.
    #[must_use]
    pub fn signed_out() -> Self {
        Self { identity: None }
    }
}

/// Federated sign-in adapter.
///
/// `subscribe` emits an event when a prior session is restored and when the
/// provider session ends. An interactive `sign_in` does not emit; its caller
/// already holds the result.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Runs the interactive sign-in flow.
    async fn sign_in(&self) -> Result<IdentityAssertion, Report<IdentityProviderError>>;

    /// Ends the provider-level session. Calling it with no session is a no-op.
    async fn sign_out(&self) -> Result<(), Report<IdentityProviderError>>;

    /// Subscribes to provider session changes, delivered in order.
    fn subscribe(&self) -> ProviderSubscription;
}

/// Fan-out of provider events to every live subscriber.
///
/// Adapters embed one of these to implement [`IdentityProvider::subscribe`].
#[derive(Debug, Default)]
pub struct ProviderSessionHub {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ProviderEvent>>>,
}

impl ProviderSessionHub {
    /// Creates a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> ProviderSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        ProviderSubscription { rx }
    }

    /// Delivers `event` to every subscriber, dropping the ones that went away.
    pub fn notify(&self, event: ProviderEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of subscribers still listening.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

/// Receiving end of a provider subscription.
///
/// Dropping it unsubscribes; [`ProviderSubscription::unsubscribe`] does the
/// same explicitly.
#[derive(Debug)]
pub struct ProviderSubscription {
    rx: mpsc::UnboundedReceiver<ProviderEvent>,
}

impl ProviderSubscription {
    /// Waits for the next event. Returns `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<ProviderEvent> {
        self.rx.recv().await
    }

    /// Detaches from the provider.
    pub fn unsubscribe(mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> IdentityAssertion {
        IdentityAssertion::new("uid-alice", "alice@ignitus.network", "Alice")
    }

    #[tokio::test]
    async fn hub_delivers_events_in_order() {
        let hub = ProviderSessionHub::new();
        let mut sub = hub.subscribe();

        hub.notify(ProviderEvent::signed_in(alice()));
        hub.notify(ProviderEvent::signed_out());

        assert_eq!(sub.recv().await, Some(ProviderEvent::signed_in(alice())));
        assert_eq!(sub.recv().await, Some(ProviderEvent::signed_out()));
    }

    #[tokio::test]
    async fn hub_fans_out_to_every_subscriber() {
        let hub = ProviderSessionHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.notify(ProviderEvent::signed_out());

        assert_eq!(first.recv().await, Some(ProviderEvent::signed_out()));
        assert_eq!(second.recv().await, Some(ProviderEvent::signed_out()));
    }

    #[test]
    fn unsubscribe_detaches_from_hub() {
        let hub = ProviderSessionHub::new();
        let first = hub.subscribe();
        let second = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        first.unsubscribe();
        assert_eq!(hub.subscriber_count(), 1);

        drop(second);
        hub.notify(ProviderEvent::signed_out());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn assertion_builder_sets_fields() {
        let identity = alice();
        assert_eq!(identity.subject_id.as_str(), "uid-alice");
        assert_eq!(identity.email, "alice@ignitus.network");
        assert_eq!(identity.display_name, "Alice");
    }
}

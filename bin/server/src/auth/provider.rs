//! Per-browser identity provider adapter.
//!
//! A redirect-based login cannot be awaited in one call, so the round trip is
//! split: `/auth/login` sends the browser to the provider, `/auth/callback`
//! stages what came back, and [`IdentityProvider::sign_in`] finishes the
//! exchange. The adapter also remembers the provider-level session for its
//! browser so a page load can announce it again.

use super::oidc::AuthState;
use async_trait::async_trait;
use ignitus_platform_access::{
    IdentityAssertion, IdentityProvider, IdentityProviderError, ProviderEvent,
    ProviderSessionHub, ProviderSubscription,
};
use rootcause::prelude::Report;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Authorization-code round trip with the federated provider.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Builds the provider URL to send the browser to.
    fn authorization_url(&self) -> (String, AuthState);

    /// Redeems an authorization code for a verified identity.
    async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<IdentityAssertion, Report<IdentityProviderError>>;
}

/// What the provider sent back to `/auth/callback`.
#[derive(Debug, Clone)]
pub enum Callback {
    /// The provider issued an authorization code.
    Code { code: String, state: AuthState },
    /// The provider reported an error instead.
    Error {
        error: String,
        description: Option<String>,
    },
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Identity provider for a single browser.
pub struct BrowserProvider {
    authenticator: Arc<dyn Authenticator>,
    hub: ProviderSessionHub,
    pending: Mutex<Option<Callback>>,
    signed_in: Mutex<Option<IdentityAssertion>>,
}

impl BrowserProvider {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            authenticator,
            hub: ProviderSessionHub::new(),
            pending: Mutex::new(None),
            signed_in: Mutex::new(None),
        }
    }

    /// Hands the callback to the next `sign_in`, replacing any unclaimed one.
    pub fn stage_callback(&self, callback: Callback) {
        *lock(&self.pending) = Some(callback);
    }

    /// Returns the identity signed in at the provider, if any.
    pub fn identity(&self) -> Option<IdentityAssertion> {
        lock(&self.signed_in).clone()
    }

    /// Re-announces the provider session the way a page load does.
    ///
    /// Returns false if nobody is signed in at the provider.
    pub fn announce(&self) -> bool {
        let Some(identity) = self.identity() else {
            return false;
        };
        self.hub.notify(ProviderEvent::signed_in(identity));
        true
    }
}

#[async_trait]
impl IdentityProvider for BrowserProvider {
    async fn sign_in(&self) -> Result<IdentityAssertion, Report<IdentityProviderError>> {
        let callback = lock(&self.pending)
            .take()
            .ok_or(IdentityProviderError::Cancelled)?;

        let identity = match callback {
            Callback::Code { code, state } => {
                self.authenticator.exchange_code(&code, &state).await?
            }
            Callback::Error { error, .. } if error == "access_denied" => {
                return Err(IdentityProviderError::Cancelled.into());
            }
            Callback::Error { error, description } => {
                let reason = match description {
                    Some(description) => format!("{}: {}", error, description),
                    None => error,
                };
                return Err(IdentityProviderError::Rejected { reason }.into());
            }
        };

        *lock(&self.signed_in) = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), Report<IdentityProviderError>> {
        let previous = lock(&self.signed_in).take();
        if previous.is_some() {
            self.hub.notify(ProviderEvent::signed_out());
        }
        Ok(())
    }

    fn subscribe(&self) -> ProviderSubscription {
        self.hub.subscribe()
    }
}

//! Authentication for the admin console.
//!
//! - OIDC sign-in through an external identity provider
//! - Per-browser [`SessionGate`](ignitus_platform_access::SessionGate)s held in
//!   a [`SessionRegistry`]
//! - Directory lookups against Firestore
//!
//! Authentication proves who the visitor is; the gate then decides whether
//! that person may administer the platform, and re-decides on every protected
//! page load so a block or role change takes effect without a new login.

pub mod firestore;
pub mod oidc;
pub mod provider;
pub mod registry;
pub mod routes;

use crate::config::SessionConfig;
use ignitus_platform_access::{GateConfig, RouteGuard};
use std::sync::Arc;

pub use firestore::FirestoreDirectory;
pub use oidc::OidcClient;
pub use provider::{Authenticator, BrowserProvider};
pub use registry::{ConsoleSession, SessionRegistry};
pub use routes::{callback, login, logout};

/// Shared application state.
pub struct AppState {
    /// Live console sessions.
    pub registry: SessionRegistry,
    /// Builds provider redirect URLs.
    pub authenticator: Arc<dyn Authenticator>,
    /// Decides protected route access.
    pub guard: RouteGuard,
    /// Gate settings.
    pub gate_config: GateConfig,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        registry: SessionRegistry,
        authenticator: Arc<dyn Authenticator>,
        gate_config: GateConfig,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            registry,
            authenticator,
            guard: gate_config.route_guard(),
            gate_config,
            session_config,
        }
    }
}

//! Session authorization gate for the Ignitus admin console.
//!
//! Decides whether a person who completed federated sign-in may see the
//! console. Authentication is delegated to an [`IdentityProvider`];
//! authorization combines a [`DirectoryRecord`] (role and block flag) with a
//! deployment-time [`AllowList`].
//!
//! - [`policy::decide`]: pure verdict over identity, record, and allow-list
//! - [`SessionGate`]: drives sign-in, restore, and sign-out, and owns the
//!   only writer of [`SessionState`]
//! - [`RouteGuard`]: maps a session state to allow, pending, or redirect
//!
//! # Example
//!
//! ```
//! use ignitus_platform_access::{
//!     AllowList, DirectoryRecord, IdentityAssertion, Role, Verdict, policy,
//! };
//!
//! let identity = IdentityAssertion::new("uid-1", "ops@ignitus.network", "Ops");
//! let record = DirectoryRecord::new("uid-1", Role::Admin, false);
//! let allow_list = AllowList::new(["ops@ignitus.network"]);
//!
//! assert_eq!(policy::decide(&identity, Some(&record), &allow_list), Verdict::Admit);
//! ```

pub mod allow_list;
pub mod config;
pub mod directory;
pub mod error;
pub mod gate;
pub mod guard;
pub mod identity;
pub mod oidc;
pub mod policy;
pub mod role;
pub mod session;

#[cfg(test)]
mod testing;

pub use allow_list::AllowList;
pub use config::GateConfig;
pub use directory::{DirectoryRecord, DirectoryStore};
pub use error::{DirectoryError, GateError, IdentityProviderError};
pub use gate::{RestoreHandle, SessionGate};
pub use guard::{GuardDecision, RouteGuard};
pub use identity::{
    IdentityAssertion, IdentityProvider, ProviderEvent, ProviderSessionHub, ProviderSubscription,
};
pub use oidc::{OidcConfig, OidcConfigBuilder};
pub use policy::{DenyReason, Verdict};
pub use role::Role;
pub use session::{SessionState, SessionStatus, SessionView};

//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `IdentityProviderError`: the federated sign-in round trip or provider sign-out failed
//! - `DirectoryError`: the directory record could not be read
//! - `GateError`: a gate operation was refused or overtaken
//!
//! None of these ever reaches `SessionState` directly. The gate maps adapter
//! failures onto a [`DenyReason`](crate::DenyReason) so the session fails closed.

use ignitus_core::SubjectId;
use std::fmt;

/// Errors raised by an identity provider adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityProviderError {
    /// The user closed or cancelled the interactive flow.
    Cancelled,
    /// The provider rejected the attempt or returned an unusable assertion.
    Rejected { reason: String },
    /// The provider could not be reached.
    Unavailable { reason: String },
    /// The assertion lacked a required claim.
    MissingClaim { claim: String },
}

impl fmt::Display for IdentityProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "sign-in was cancelled"),
            Self::Rejected { reason } => write!(f, "identity provider rejected sign-in: {reason}"),
            Self::Unavailable { reason } => {
                write!(f, "identity provider unavailable: {reason}")
            }
            Self::MissingClaim { claim } => {
                write!(f, "identity assertion missing required claim: {claim}")
            }
        }
    }
}

impl std::error::Error for IdentityProviderError {}

/// Errors raised by a directory store client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Transport failure talking to the store.
    Transport { reason: String },
    /// The store answered with an unexpected status.
    UnexpectedStatus { subject: SubjectId, status: u16 },
    /// The stored document could not be interpreted.
    MalformedRecord { subject: SubjectId, reason: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { reason } => write!(f, "directory transport error: {reason}"),
            Self::UnexpectedStatus { subject, status } => {
                write!(f, "directory returned status {status} for subject {subject}")
            }
            Self::MalformedRecord { subject, reason } => {
                write!(f, "malformed directory record for subject {subject}: {reason}")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Errors from session gate operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// Another interactive sign-in is still in flight.
    SignInInProgress,
    /// A sign-out or a newer provider notification replaced this attempt
    /// before its verdict could be committed.
    Superseded,
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignInInProgress => write!(f, "a sign-in attempt is already in progress"),
            Self::Superseded => write!(f, "sign-in attempt was superseded by a newer session event"),
        }
    }
}

impl std::error::Error for GateError {}

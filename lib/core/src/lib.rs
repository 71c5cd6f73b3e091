//! Core domain types shared by the Ignitus admin console crates.
//!
//! This crate provides the `Result` alias used across the workspace and the
//! strongly-typed identifiers for directory subjects and console sessions.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, SessionId, SubjectId};

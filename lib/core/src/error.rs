//! Error handling foundation for the admin console.
//!
//! Only the `Result` alias lives here. Each crate defines its own error
//! enums next to the code that raises them and wraps them in a rootcause
//! `Report` at the boundary where they leave the crate.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

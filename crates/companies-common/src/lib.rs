//! Companies Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared infrastructure for the companies workspace members.
//!
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//! - **Errors**: [`CommonError`] and its result alias

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CommonError, Result};

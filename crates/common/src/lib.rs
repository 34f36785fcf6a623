//! Folio Common Utilities
//!
//! Shared infrastructure for all Folio crates:
//! - Error types and result aliases
//! - Millisecond timing helpers for the motion host
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;

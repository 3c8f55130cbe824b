//! Pointerflow Common Utilities
//!
//! Shared infrastructure for all Pointerflow crates:
//! - Error types and result aliases
//! - Timestamp helpers and rate gating
//! - Tracing/logging initialization
//! - Recognizer configuration and loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;

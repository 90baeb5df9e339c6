//! Error types for lumo-ssl.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;

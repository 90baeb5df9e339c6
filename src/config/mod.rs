//! Configuration module for lumo-ssl.
//!
//! Handles loading and validating configuration from TOML files.

mod settings;

pub use settings::*;

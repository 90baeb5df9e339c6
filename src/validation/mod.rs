//! Input validation module.
//!
//! Validators for operator-supplied domains, app names and the ACME account email.

mod domain;
mod email;

pub use domain::{validate_app_name, validate_domain};
pub use email::validate_email;

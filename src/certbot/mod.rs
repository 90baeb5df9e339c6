//! Certificate acquisition.
//!
//! Drives the certbot client and turns its output into an [`IssueOutcome`].

mod client;
mod outcome;

pub use client::CertbotClient;
pub use outcome::{IssueOutcome, MarkerClassifier, OutcomeClassifier};

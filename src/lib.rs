//! lumo-ssl library
//!
//! Discovers ServerPilot-style apps from their nginx vhost files, obtains
//! Let's Encrypt certificates for them through certbot, installs HTTPS
//! vhosts, and manages the cron jobs for renewal and autopilot runs.

pub mod apps;
pub mod certbot;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod files;
pub mod nginx;
pub mod report;
pub mod schedule;
pub mod templates;
pub mod validation;
pub mod vhost;

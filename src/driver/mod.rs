//! Sequencing of modes into calls on discovery, certbot, vhosts and cron.

mod run;
mod summary;

pub use run::Driver;
pub use summary::RunSummary;

//! Periodic job registration.

mod cron;

pub use cron::{CronJob, CronRegistrar};

//! Command executor module.
//!
//! Handles subprocess spawning, timeouts and the runner abstraction.

mod output;
mod runner;
mod subprocess;

#[cfg(test)]
pub(crate) mod testing;

pub use output::sanitize_output;
pub use runner::{argv, shell, CommandRunner, SystemRunner};
pub use subprocess::{SubprocessBuilder, SubprocessResult};

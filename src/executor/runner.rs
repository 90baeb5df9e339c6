//! The process boundary.
//!
//! Everything that spawns a program goes through [`CommandRunner`], so the
//! certificate and vhost logic can be exercised with scripted runners.

use std::time::Duration;

use crate::error::SslError;

use super::subprocess::{SubprocessBuilder, SubprocessResult};

/// Runs an external command given as an argv vector.
pub trait CommandRunner {
    /// Run `argv[0]` with the remaining elements as arguments and wait for it.
    fn run(&self, argv: &[String], timeout: Duration) -> Result<SubprocessResult, SslError>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], timeout: Duration) -> Result<SubprocessResult, SslError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| SslError::execution_failed("Empty command line"))?;

        SubprocessBuilder::new(program)
            .args(args)
            .timeout(timeout)
            .run()
    }
}

/// Build an argv vector from string slices.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

/// Argv running `script` through `sh -c`.
pub fn shell(script: &str) -> Vec<String> {
    argv(["sh", "-c", script])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_runner() {
        let result = SystemRunner
            .run(&argv(["echo", "runner"]), Duration::from_secs(5))
            .unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "runner");
    }

    #[test]
    fn test_empty_argv() {
        assert!(SystemRunner.run(&[], Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_shell_pipeline() {
        let result = SystemRunner
            .run(&shell("echo one && echo two"), Duration::from_secs(5))
            .unwrap();
        assert_eq!(result.stdout, "one\ntwo\n");
    }
}

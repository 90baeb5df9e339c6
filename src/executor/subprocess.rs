//! Subprocess execution.
//!
//! Runs external programs without shell interpretation, with captured
//! stdout/stderr and a kill-on-timeout deadline.

use std::io::ErrorKind;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{CommandErrorKind, SslError};

/// Result of a subprocess execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubprocessResult {
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
    /// The exit code, if available.
    pub exit_code: Option<i32>,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl SubprocessResult {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Stdout followed by stderr, the way a terminal would show both.
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

/// Builder for subprocess execution.
pub struct SubprocessBuilder {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SubprocessBuilder {
    /// Create a new subprocess builder.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Add arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Set the timeout for the command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute the command and wait for completion with timeout enforcement.
    ///
    /// A program that cannot be found yields `CommandErrorKind::NotFound`.
    /// If the process exceeds the timeout it is killed and
    /// `CommandErrorKind::Timeout` is returned.
    pub fn run(self) -> Result<SubprocessResult, SslError> {
        debug!(
            program = %self.program,
            args = ?self.args,
            timeout_secs = self.timeout.as_secs(),
            "Executing subprocess"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SslError::Command {
                    kind: CommandErrorKind::NotFound {
                        program: self.program.clone(),
                    },
                },
                _ => SslError::execution_failed(format!(
                    "Failed to spawn {}: {}",
                    self.program, e
                )),
            })?;

        // Output pipes are drained on separate threads so a chatty child
        // cannot block on a full pipe while we poll for exit.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let start = Instant::now();
        let poll_interval = Duration::from_millis(50);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        warn!(
                            program = %self.program,
                            timeout_secs = self.timeout.as_secs(),
                            "Process timed out, killing"
                        );
                        if let Err(e) = child.kill() {
                            warn!(error = %e, "Failed to kill timed-out process");
                        }
                        let _ = child.wait();
                        return Err(SslError::Command {
                            kind: CommandErrorKind::Timeout {
                                timeout_secs: self.timeout.as_secs(),
                            },
                        });
                    }
                    std::thread::sleep(poll_interval);
                }
                Err(e) => {
                    return Err(SslError::execution_failed(format!(
                        "Failed to check process status: {}",
                        e
                    )));
                }
            }
        };

        let output = Output {
            status,
            stdout: join_reader(stdout_reader),
            stderr: join_reader(stderr_reader),
        };
        let result = SubprocessResult::from_output(output);
        debug!(
            program = %self.program,
            success = result.success,
            exit_code = ?result.exit_code,
            duration_ms = start.elapsed().as_millis(),
            "Subprocess completed"
        );
        Ok(result)
    }
}

fn spawn_reader<R>(mut pipe: R) -> std::thread::JoinHandle<Vec<u8>>
where
    R: std::io::Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: Option<std::thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

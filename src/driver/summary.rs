//! Tally of one invocation.

/// What an invocation attempted and how each attempt ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Apps secured, or maintenance actions completed.
    pub succeeded: Vec<String>,
    /// Apps or actions that failed.
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, ok: bool) {
        if ok {
            self.succeeded.push(name.into());
        } else {
            self.failed.push(name.into());
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Process exit status: 0 when nothing failed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

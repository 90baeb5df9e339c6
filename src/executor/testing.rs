//! Scripted command runner for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{CommandErrorKind, SslError};

use super::runner::CommandRunner;
use super::subprocess::SubprocessResult;

/// Canned reply for one invocation.
pub enum Reply {
    Exit { code: i32, stdout: String },
    NotFound,
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Reply::Exit {
            code: 0,
            stdout: stdout.to_string(),
        }
    }

    pub fn exit(code: i32, stdout: &str) -> Self {
        Reply::Exit {
            code,
            stdout: stdout.to_string(),
        }
    }
}

/// Replays queued replies per program and records every argv it sees.
/// Programs without a queued reply exit 0 with no output.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: RefCell<Vec<(String, VecDeque<Reply>)>>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, program: &str, reply: Reply) -> Self {
        {
            let mut replies = self.replies.borrow_mut();
            match replies.iter_mut().find(|(p, _)| p == program) {
                Some((_, queue)) => queue.push_back(reply),
                None => replies.push((program.to_string(), VecDeque::from([reply]))),
            }
        }
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|argv| argv.first().map(String::as_str) == Some(program))
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, argv: &[String], _timeout: Duration) -> Result<SubprocessResult, SslError> {
        self.calls.borrow_mut().push(argv.to_vec());
        let program = argv.first().cloned().unwrap_or_default();

        let reply = self
            .replies
            .borrow_mut()
            .iter_mut()
            .find(|(p, _)| *p == program)
            .and_then(|(_, queue)| queue.pop_front());

        match reply {
            Some(Reply::NotFound) => Err(SslError::Command {
                kind: CommandErrorKind::NotFound { program },
            }),
            Some(Reply::Exit { code, stdout }) => Ok(SubprocessResult {
                success: code == 0,
                exit_code: Some(code),
                stdout,
                stderr: String::new(),
            }),
            None => Ok(SubprocessResult {
                success: true,
                exit_code: Some(0),
                ..SubprocessResult::default()
            }),
        }
    }
}

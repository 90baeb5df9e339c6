//! Certificate requests through the certbot command-line client.

use std::cell::Cell;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::apps::ApplicationRecord;
use crate::config::CertbotConfig;
use crate::error::{CommandErrorKind, SslError};
use crate::executor::{argv, sanitize_output, shell, CommandRunner, SubprocessResult};

use super::outcome::{IssueOutcome, MarkerClassifier, OutcomeClassifier};

/// Lines of client output kept in failure logs.
const OUTPUT_TAIL_LINES: usize = 8;

/// Obtains certificates for apps by running certbot in webroot mode.
///
/// The client is probed (and installed if missing) once, before the first
/// request made through this value.
pub struct CertbotClient<'a> {
    runner: &'a dyn CommandRunner,
    config: CertbotConfig,
    classifier: Box<dyn OutcomeClassifier>,
    probed: Cell<bool>,
}

impl<'a> CertbotClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: CertbotConfig) -> Self {
        let classifier = config
            .extra_success_markers
            .iter()
            .fold(MarkerClassifier::certbot(), |c, marker| {
                c.with_rule(marker.as_str(), IssueOutcome::Success)
            });

        Self {
            runner,
            config,
            classifier: Box::new(classifier),
            probed: Cell::new(false),
        }
    }

    /// Replace the output classifier.
    pub fn with_classifier(mut self, classifier: Box<dyn OutcomeClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Request a fresh certificate covering every domain of `record`.
    ///
    /// Always forces renewal, so re-running re-issues even a valid
    /// certificate. On success certbot has written
    /// `<live_dir>/<primary domain>/{fullchain,privkey}.pem`.
    pub fn issue_certificate(&self, record: &ApplicationRecord) -> IssueOutcome {
        self.ensure_installed();

        if !record.document_root().is_dir() {
            warn!(
                app = record.name(),
                root = %record.document_root().display(),
                "Document root is not a directory"
            );
            return IssueOutcome::InvalidRoot;
        }

        let command = self.request_command(record);
        debug!(app = record.name(), domains = ?record.domains(), "Requesting certificate");

        let output = match self.runner.run(&command, self.config.timeout()) {
            Ok(result) => result.combined_output(),
            Err(e) => {
                warn!(app = record.name(), error = %e, "Certificate client could not be run");
                return IssueOutcome::UnknownFailure;
            }
        };

        let outcome = self.classifier.classify(&output);
        if outcome.is_success() {
            info!(app = record.name(), domain = record.primary_domain(), "Certificate issued");
        } else {
            warn!(
                app = record.name(),
                outcome = %outcome,
                output = %sanitize_output(&output, OUTPUT_TAIL_LINES),
                "Certificate request failed"
            );
        }
        outcome
    }

    /// Renew every certificate certbot manages that is close to expiry.
    pub fn renew_all(&self) -> Result<SubprocessResult, SslError> {
        self.ensure_installed();

        let command = argv([self.config.program.as_str(), "renew", "--non-interactive"]);
        let result = self.runner.run(&command, self.config.timeout())?;
        if !result.success {
            warn!(
                exit_code = ?result.exit_code,
                output = %sanitize_output(&result.combined_output(), OUTPUT_TAIL_LINES),
                "Certificate renewal failed"
            );
        }
        Ok(result)
    }

    /// The argv of a certificate request for `record`.
    pub fn request_command(&self, record: &ApplicationRecord) -> Vec<String> {
        let mut command = argv([
            self.config.program.as_str(),
            "certonly",
            "--webroot",
            "-w",
        ]);
        command.push(path_arg(record.document_root()));
        command.extend(argv([
            "--non-interactive",
            "--agree-tos",
            "--force-renewal",
        ]));

        match &self.config.email {
            Some(email) => command.extend(argv(["--email", email.as_str()])),
            None => command.push("--register-unsafely-without-email".to_string()),
        }

        if self.config.staging {
            command.push("--staging".to_string());
        }

        for domain in record.domains() {
            command.push("-d".to_string());
            command.push(domain.clone());
        }

        command
    }

    /// Probe for the client once and run the install pipeline if it is missing.
    ///
    /// A failed install is only logged; the request that follows fails on
    /// its own if the client is still unavailable.
    fn ensure_installed(&self) {
        if self.probed.replace(true) {
            return;
        }

        let probe = argv([self.config.program.as_str()]);
        let missing = match self.runner.run(&probe, self.config.timeout()) {
            Ok(result) => result
                .exit_code
                .is_some_and(|code| self.config.missing_exit_codes.contains(&code)),
            Err(SslError::Command {
                kind: CommandErrorKind::NotFound { .. },
            }) => true,
            Err(e) => {
                warn!(error = %e, "Certificate client probe failed, assuming it is installed");
                false
            }
        };

        if !missing {
            debug!(program = %self.config.program, "Certificate client present");
            return;
        }

        info!(program = %self.config.program, "Certificate client not found, installing");
        match self
            .runner
            .run(&shell(&self.config.install_command), self.config.timeout())
        {
            Ok(result) if result.success => info!("Certificate client installed"),
            Ok(result) => warn!(
                exit_code = ?result.exit_code,
                output = %sanitize_output(&result.combined_output(), OUTPUT_TAIL_LINES),
                "Certificate client installation failed"
            ),
            Err(e) => warn!(error = %e, "Certificate client installation could not be run"),
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

//! Classification of certificate request results.

use std::fmt;

/// Result of one certificate request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    /// Certificate and key were written under the live directory.
    Success,
    /// The CA could not validate the domains (DNS or webroot mismatch).
    AuthorizationFailed,
    /// The CA refused because of rate limits.
    RateLimited,
    /// The document root is not a directory; the client was not invoked.
    InvalidRoot,
    /// Anything else, including a client that could not be run.
    UnknownFailure,
}

impl IssueOutcome {
    pub fn is_success(self) -> bool {
        self == IssueOutcome::Success
    }
}

impl fmt::Display for IssueOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IssueOutcome::Success => "success",
            IssueOutcome::AuthorizationFailed => "authorization failed",
            IssueOutcome::RateLimited => "rate limited",
            IssueOutcome::InvalidRoot => "invalid document root",
            IssueOutcome::UnknownFailure => "unknown failure",
        };
        f.write_str(text)
    }
}

/// Maps issuing-client output to an outcome.
pub trait OutcomeClassifier {
    fn classify(&self, output: &str) -> IssueOutcome;
}

/// Ordered substring rules; the first rule whose marker appears wins.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    rules: Vec<(String, IssueOutcome)>,
}

impl MarkerClassifier {
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = (S, IssueOutcome)>,
        S: Into<String>,
    {
        Self {
            rules: rules.into_iter().map(|(m, o)| (m.into(), o)).collect(),
        }
    }

    /// Markers printed by certbot.
    pub fn certbot() -> Self {
        Self::new([
            ("Congratulations", IssueOutcome::Success),
            (
                "Failed authorization procedure",
                IssueOutcome::AuthorizationFailed,
            ),
            ("too many requests", IssueOutcome::RateLimited),
        ])
    }

    /// Append a lower-priority rule.
    pub fn with_rule(mut self, marker: impl Into<String>, outcome: IssueOutcome) -> Self {
        self.rules.push((marker.into(), outcome));
        self
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::certbot()
    }
}

impl OutcomeClassifier for MarkerClassifier {
    fn classify(&self, output: &str) -> IssueOutcome {
        self.rules
            .iter()
            .find(|(marker, _)| output.contains(marker.as_str()))
            .map(|(_, outcome)| *outcome)
            .unwrap_or(IssueOutcome::UnknownFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certbot_markers() {
        let classifier = MarkerClassifier::certbot();
        assert_eq!(
            classifier.classify("Congratulations! Your certificate and chain have been saved"),
            IssueOutcome::Success
        );
        assert_eq!(
            classifier.classify("Failed authorization procedure. a.com (http-01): unauthorized"),
            IssueOutcome::AuthorizationFailed
        );
        assert_eq!(
            classifier.classify("Error creating new order :: too many requests"),
            IssueOutcome::RateLimited
        );
        assert_eq!(
            classifier.classify("An unexpected error occurred"),
            IssueOutcome::UnknownFailure
        );
        assert_eq!(classifier.classify(""), IssueOutcome::UnknownFailure);
    }

    #[test]
    fn test_first_marker_wins() {
        let classifier = MarkerClassifier::certbot();
        assert_eq!(
            classifier.classify("too many requests ... Congratulations"),
            IssueOutcome::Success
        );
        assert_eq!(
            classifier.classify("too many requests\nFailed authorization procedure"),
            IssueOutcome::AuthorizationFailed
        );
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        assert_eq!(
            MarkerClassifier::certbot().classify("congratulations"),
            IssueOutcome::UnknownFailure
        );
    }

    #[test]
    fn test_custom_rules() {
        let classifier = MarkerClassifier::new([(
            "Successfully received certificate",
            IssueOutcome::Success,
        )]);
        assert_eq!(
            classifier.classify("Successfully received certificate."),
            IssueOutcome::Success
        );
        assert_eq!(classifier.classify("Congratulations"), IssueOutcome::UnknownFailure);
    }

    #[test]
    fn test_appended_rule_has_lowest_priority() {
        let classifier = MarkerClassifier::certbot()
            .with_rule("Successfully received certificate", IssueOutcome::Success);
        assert_eq!(
            classifier.classify("Successfully received certificate."),
            IssueOutcome::Success
        );
        assert_eq!(
            classifier.classify("too many requests; Successfully received certificate"),
            IssueOutcome::RateLimited
        );
    }
}

//! Error types for lumo-ssl.

use std::path::PathBuf;
use thiserror::Error;

use crate::nginx::ParseError;

/// Main error type for the tool.
#[derive(Error, Debug)]
pub enum SslError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors.
    #[error("Validation error: {kind}")]
    Validation { kind: ValidationErrorKind },

    /// External command errors.
    #[error("Command error: {kind}")]
    Command { kind: CommandErrorKind },

    /// Template-related errors.
    #[error("Template error: {message}")]
    Template { message: String },

    /// Vhost or schedule file could not be written, or the reload after it failed.
    #[error("Write error for {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    /// No application config exists under the requested name.
    #[error("App not found: {name}")]
    AppNotFound { name: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation error kinds.
#[derive(Error, Debug)]
pub enum ValidationErrorKind {
    #[error("Invalid domain: {domain}")]
    InvalidDomain { domain: String },

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

/// Command error kinds.
#[derive(Error, Debug)]
pub enum CommandErrorKind {
    #[error("Program not found: {program}")]
    NotFound { program: String },

    #[error("Command execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("Command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

/// Reasons a vhost config file produced no application record.
///
/// Discovery never surfaces these to the operator; the registry logs them
/// at debug level and moves on to the next file.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Malformed(#[from] ParseError),

    #[error("no server block")]
    MissingServerBlock,

    #[error("missing '{0}' directive")]
    MissingDirective(&'static str),

    #[error("root '{root}' does not contain an apps/<name>/ segment")]
    MissingAppMarker { root: String },
}

impl SslError {
    /// Shorthand for an invalid parameter error.
    pub fn invalid_parameter(param: &str, message: impl Into<String>) -> Self {
        SslError::Validation {
            kind: ValidationErrorKind::InvalidParameter {
                param: param.to_string(),
                message: message.into(),
            },
        }
    }

    /// Shorthand for a failed command error.
    pub fn execution_failed(message: impl Into<String>) -> Self {
        SslError::Command {
            kind: CommandErrorKind::ExecutionFailed {
                message: message.into(),
            },
        }
    }
}

/// Result type alias for lumo-ssl operations.
pub type SslResult<T> = Result<T, SslError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_mentions_path() {
        let err = SslError::Write {
            path: PathBuf::from("/etc/nginx-sp/vhosts.d/app-ssl.conf"),
            message: "disk full".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("app-ssl.conf"));
        assert!(text.contains("disk full"));
    }

    #[test]
    fn test_discovery_error_messages() {
        assert_eq!(
            DiscoveryError::MissingDirective("root").to_string(),
            "missing 'root' directive"
        );
        let err = DiscoveryError::MissingAppMarker {
            root: "/var/www/html".to_string(),
        };
        assert!(err.to_string().contains("/var/www/html"));
    }
}

//! Domain and app name validation.
//!
//! Applied to names and domains typed by the operator. Domains discovered
//! from existing vhost files are taken as they are.

use crate::error::{SslError, ValidationErrorKind};

/// Maximum length for a domain name.
const MAX_DOMAIN_LENGTH: usize = 253;

/// Maximum length for a domain label (part between dots).
const MAX_LABEL_LENGTH: usize = 63;

/// Maximum length for an app name.
const MAX_APP_NAME_LENGTH: usize = 64;

/// Validates a domain name for a certificate request.
///
/// # Rules
///
/// - Must be 1-253 characters
/// - Each label must be 1-63 characters, alphanumeric or hyphen,
///   not starting or ending with a hyphen
/// - No wildcards (webroot validation cannot issue them)
/// - At least two labels
///
/// A single trailing dot is accepted and stripped.
pub fn validate_domain(domain: &str) -> Result<&str, SslError> {
    if domain.is_empty() {
        return Err(SslError::invalid_parameter(
            "domain",
            "Domain name cannot be empty",
        ));
    }

    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err(SslError::invalid_parameter(
            "domain",
            format!(
                "Domain name exceeds maximum length of {} characters",
                MAX_DOMAIN_LENGTH
            ),
        ));
    }

    if domain.contains('*') {
        return Err(SslError::Validation {
            kind: ValidationErrorKind::InvalidDomain {
                domain: domain.to_string(),
            },
        });
    }

    let domain = domain.strip_suffix('.').unwrap_or(domain);
    let labels: Vec<&str> = domain.split('.').collect();

    if labels.len() < 2 {
        return Err(SslError::invalid_parameter(
            "domain",
            "Domain must have at least two parts (e.g., example.com)",
        ));
    }

    for label in &labels {
        validate_domain_label(label)?;
    }

    Ok(domain)
}

fn validate_domain_label(label: &str) -> Result<(), SslError> {
    if label.is_empty() {
        return Err(SslError::invalid_parameter(
            "domain",
            "Domain contains empty label (consecutive dots)",
        ));
    }

    if label.len() > MAX_LABEL_LENGTH {
        return Err(SslError::invalid_parameter(
            "domain",
            format!(
                "Domain label '{}' exceeds maximum length of {} characters",
                label, MAX_LABEL_LENGTH
            ),
        ));
    }

    if label.starts_with('-') || label.ends_with('-') {
        return Err(SslError::invalid_parameter(
            "domain",
            format!("Domain label '{}' must start and end with a letter or number", label),
        ));
    }

    if let Some(c) = label.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
        return Err(SslError::invalid_parameter(
            "domain",
            format!("Domain label '{}' contains invalid character '{}'", label, c),
        ));
    }

    Ok(())
}

/// Validates an app name used to build a vhost file path.
///
/// # Rules
///
/// - Must be 1-64 characters
/// - Alphanumeric, dots, dashes and underscores only
/// - Must start with an alphanumeric character
/// - No `..` sequences
pub fn validate_app_name(name: &str) -> Result<&str, SslError> {
    let Some(first_char) = name.chars().next() else {
        return Err(SslError::invalid_parameter("name", "App name cannot be empty"));
    };

    if name.len() > MAX_APP_NAME_LENGTH {
        return Err(SslError::invalid_parameter(
            "name",
            format!(
                "App name exceeds maximum length of {} characters",
                MAX_APP_NAME_LENGTH
            ),
        ));
    }

    if !first_char.is_ascii_alphanumeric() {
        return Err(SslError::invalid_parameter(
            "name",
            "App name must start with a letter or number",
        ));
    }

    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_'))
    {
        return Err(SslError::invalid_parameter(
            "name",
            format!("App name contains invalid character '{}'", c),
        ));
    }

    if name.contains("..") {
        return Err(SslError::invalid_parameter(
            "name",
            "App name contains path traversal sequence",
        ));
    }

    Ok(name)
}

//! ACME account email validation.

use crate::error::SslError;

/// Validates an email address passed to the issuing client.
///
/// Basic structural check plus rejection of characters that could be
/// used for argument injection.
pub fn validate_email(email: &str) -> Result<(), SslError> {
    if email.is_empty() {
        return Err(SslError::invalid_parameter("email", "Email cannot be empty"));
    }

    if email.len() > 254 {
        return Err(SslError::invalid_parameter(
            "email",
            "Email exceeds maximum length",
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(SslError::invalid_parameter("email", "Invalid email format"));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(SslError::invalid_parameter("email", "Invalid email format"));
    }

    if !domain.contains('.') {
        return Err(SslError::invalid_parameter(
            "email",
            "Email domain must contain a dot",
        ));
    }

    if local.starts_with('-') {
        return Err(SslError::invalid_parameter(
            "email",
            "Email cannot start with '-'",
        ));
    }

    if let Some(c) = email.chars().find(|c| {
        c.is_whitespace()
            || c.is_control()
            || matches!(
                c,
                '<' | '>' | '"' | '\'' | '`' | '$' | '&' | '|' | ';' | '(' | ')' | '[' | ']'
                    | '{' | '}' | '\\' | '!' | '#' | '*' | '?' | '~'
            )
    }) {
        return Err(SslError::invalid_parameter(
            "email",
            format!("Email contains invalid character: '{}'", c),
        ));
    }

    Ok(())
}

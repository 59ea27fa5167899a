use super::SubscriberError;

/// Maximum length of an email address in characters (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validates and normalizes an email address.
///
/// Returns the trimmed, lowercased address. Requires exactly one `@`, a
/// non-empty local part and a dotted domain without empty labels.
///
/// # Examples
///
/// ```
/// use feedletter_core::subscriber::validate_email;
///
/// assert_eq!(
///     validate_email("  Reader@Example.COM "),
///     Ok("reader@example.com".to_string())
/// );
/// assert!(validate_email("not-an-email").is_err());
/// ```
pub fn validate_email(raw: &str) -> Result<String, SubscriberError> {
    let email = raw.trim();

    if email.is_empty() {
        return Err(SubscriberError::EmptyEmail);
    }

    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(SubscriberError::EmailTooLong);
    }

    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(SubscriberError::InvalidEmail(email.to_string()));
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(SubscriberError::InvalidEmail(email.to_string()));
    };

    if local.is_empty() || !is_valid_domain(domain) {
        return Err(SubscriberError::InvalidEmail(email.to_string()));
    }

    Ok(email.to_lowercase())
}

fn is_valid_domain(domain: &str) -> bool {
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

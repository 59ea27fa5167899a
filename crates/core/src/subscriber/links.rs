//! Subscriber tokens and the links built from them.
//!
//! A token is the subscriber's email encoded as URL-safe base64. Tokens are
//! emitted without padding; padded tokens are accepted as well.

use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine,
};

use super::{validate_email, SubscriberError};

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes an email address into a subscriber token.
pub fn encode_token(email: &str) -> String {
    TOKEN_ENGINE.encode(email.as_bytes())
}

/// Decodes a subscriber token back into a normalized email address.
///
/// Fails with [`SubscriberError::InvalidToken`] when the token is not
/// URL-safe base64, not UTF-8, or does not hold a valid email.
///
/// # Examples
///
/// ```
/// use feedletter_core::subscriber::{decode_token, encode_token};
///
/// let token = encode_token("reader@example.com");
/// assert_eq!(decode_token(&token).unwrap(), "reader@example.com");
/// assert!(decode_token("%%%").is_err());
/// ```
pub fn decode_token(token: &str) -> Result<String, SubscriberError> {
    let bytes = TOKEN_ENGINE
        .decode(token.trim())
        .map_err(|_| SubscriberError::InvalidToken)?;
    let email = String::from_utf8(bytes).map_err(|_| SubscriberError::InvalidToken)?;
    validate_email(&email).map_err(|_| SubscriberError::InvalidToken)
}

/// Builds the confirmation link sent after subscribing.
pub fn confirm_link(public_url: &str, email: &str) -> String {
    subscriber_link(public_url, "confirm", email)
}

/// Builds the unsubscribe link embedded in every newsletter.
pub fn unsubscribe_link(public_url: &str, email: &str) -> String {
    subscriber_link(public_url, "unsubscribe", email)
}

fn subscriber_link(public_url: &str, action: &str, email: &str) -> String {
    format!(
        "{}/api/subscribers/{action}?token={}",
        public_url.trim_end_matches('/'),
        encode_token(email)
    )
}

/// Where the browser lands after submitting the subscribe form.
pub fn success_redirect(site_url: Option<&str>) -> String {
    let base = site_url.map(|url| url.trim_end_matches('/')).unwrap_or("");
    format!("{base}/success/")
}

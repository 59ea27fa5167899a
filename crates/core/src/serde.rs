//! Serde helper functions for form and query deserialization.
//!
//! HTML forms and hand-written query strings send `email=` for a missing
//! value; these helpers treat blank strings as `None`.

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, treating empty or blank strings as None.
///
/// Surrounding whitespace is removed from present values.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

//! Helpers for cleaning up free text submitted by clients.

use crate::Error;

/// Trim `value` and reject it if nothing is left.
///
/// # Errors
///
/// Returns [Error::EmptyField] naming `field` if `value` is empty or only whitespace.
pub fn required(field: &'static str, value: &str) -> Result<String, Error> {
    let value = value.trim();

    if value.is_empty() {
        Err(Error::EmptyField(field))
    } else {
        Ok(value.to_owned())
    }
}

/// Trim `value`, treating an empty string the same as a missing value.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

//! Input validation helpers shared by the row types.

use serde::{Deserialize, Deserializer};

use crate::error::BlogError;

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<String, BlogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BlogError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
///
/// Use together with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_non_empty_trims() {
        assert_eq!(require_non_empty("title", "  Hi ").unwrap(), "Hi");
    }

    #[test]
    fn require_non_empty_rejects_blank() {
        let err = require_non_empty("name", "   ").unwrap_err();
        assert_eq!(err, BlogError::Validation("name must not be empty".to_string()));
    }
}

//! Field-level validation errors.
//!
//! Input validation collects every failure before reporting, so a caller
//! learns about all bad fields in one round trip. The map serializes as
//! `{"field": ["message", ...]}`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Key used for failures that do not belong to a single input field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Per-field validation messages.
///
/// # Examples
///
/// ```
/// use eventhub_core::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// errors.add("title", "This field may not be blank.");
/// assert!(!errors.is_empty());
/// assert_eq!(errors.get("title"), Some(&["This field may not be blank.".to_string()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Create an empty error map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Create an error map holding a single message.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Returns `true` if no failure has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns `true` if `field` has at least one message.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterate over `(field, messages)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the map itself when at least one failure was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_multiple_messages_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("password", "too short");
        errors.add("password", "too common");
        assert_eq!(errors.get("password").unwrap().len(), 2);
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        assert!(ValidationErrors::single("a", "b").into_result().is_err());
    }

    #[test]
    fn test_display_lists_every_message() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "required");
        errors.add("date", "bad format");
        assert_eq!(errors.to_string(), "date: bad format; title: required");
    }

    #[test]
    fn test_serializes_as_field_map() {
        let errors = ValidationErrors::single(NON_FIELD_ERRORS, "duplicate");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "non_field_errors": ["duplicate"] }));
    }
}

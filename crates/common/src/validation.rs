//! Field-level validation errors.
//!
//! Failed validation is reported as `{"field": ["message", ...]}`.

use std::collections::BTreeMap;

use serde::Serialize;
use validator::ValidationError;

use crate::serde_ext::Loose;

/// Validation messages grouped by input field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error set holding a single message.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Merge another error set into this one.
    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Move the messages of one field under another name.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(messages) = self.0.remove(from) {
            self.0.entry(to.to_string()).or_default().extend(messages);
        }
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// The first message, in field order.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0
            .values()
            .flat_map(|messages| messages.iter())
            .next()
            .map(String::as_str)
    }

    /// Read an optional integer field no smaller than `min`, recording a
    /// message when it is malformed or too small. Messages spell the field
    /// with spaces for underscores.
    pub fn integer<T>(&mut self, field: &str, value: Option<Loose<T>>, min: T) -> Option<T>
    where
        T: PartialOrd + std::fmt::Display,
    {
        let label = field.replace('_', " ");
        match value? {
            Loose::Invalid => {
                self.add(field, format!("The {label} field must be an integer."));
                None
            }
            Loose::Value(n) if n < min => {
                self.add(field, format!("The {label} field must be at least {min}."));
                None
            }
            Loose::Value(n) => Some(n),
        }
    }

    /// Read an optional boolean field.
    pub fn boolean(&mut self, field: &str, value: Option<Loose<bool>>) -> Option<bool> {
        let label = field.replace('_', " ");
        match value? {
            Loose::Invalid => {
                self.add(field, format!("The {label} field must be true or false."));
                None
            }
            Loose::Value(b) => Some(b),
        }
    }

    /// Turn a non-empty set into an `Err`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.first().unwrap_or("The given data was invalid."))
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = Self::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error.message.as_ref().map_or_else(
                    || format!("The {field} field is invalid."),
                    ToString::to_string,
                );
                out.add(field.to_string(), message);
            }
        }
        out
    }
}

/// Field rule rejecting strings that are empty once trimmed.
///
/// Use as `#[validate(custom(function = "not_blank", message = "..."))]`.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Input {
        #[validate(length(min = 1, message = "The name field is required."))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_from_validator_errors() {
        let input = Input {
            name: String::new(),
            email: "not-an-email".to_string(),
        };
        let errors: FieldErrors = input.validate().unwrap_err().into();

        assert_eq!(
            errors.get("name"),
            Some(&["The name field is required.".to_string()][..])
        );
        assert_eq!(
            errors.get("email"),
            Some(&["The email field is invalid.".to_string()][..])
        );
        assert_eq!(errors.first(), Some("The email field is invalid."));
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Intro").is_ok());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("").is_err());
    }

    #[test]
    fn test_merge_and_result() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.merge(FieldErrors::single("title", "first"));
        errors.merge(FieldErrors::single("title", "second"));

        assert_eq!(errors.get("title").map(<[String]>::len), Some(2));

        errors.rename("title", "name");
        assert!(errors.get("title").is_none());
        assert_eq!(errors.get("name").map(<[String]>::len), Some(2));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_scalar_readers() {
        let mut errors = FieldErrors::new();

        assert_eq!(errors.integer("order", Some(Loose::Value(3)), 0), Some(3));
        assert_eq!(errors.integer::<i32>("order", None, 0), None);
        assert_eq!(errors.boolean("is_active", Some(Loose::Value(false))), Some(false));
        assert!(errors.is_empty());

        assert_eq!(errors.integer("duration", Some(Loose::<i32>::Invalid), 0), None);
        assert_eq!(errors.integer("order", Some(Loose::Value(-1)), 0), None);
        assert_eq!(errors.boolean("is_active", Some(Loose::Invalid)), None);

        assert_eq!(
            errors.get("duration"),
            Some(&["The duration field must be an integer.".to_string()][..])
        );
        assert_eq!(
            errors.get("order"),
            Some(&["The order field must be at least 0.".to_string()][..])
        );
        assert_eq!(
            errors.get("is_active"),
            Some(&["The is active field must be true or false.".to_string()][..])
        );
    }

    #[test]
    fn test_serializes_as_map() {
        let errors = FieldErrors::single("email", "The email has already been taken.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": ["The email has already been taken."]})
        );
    }
}

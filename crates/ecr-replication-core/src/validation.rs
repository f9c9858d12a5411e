//! Validation traits and types for replication configuration.
//!
//! Every declared configuration passes through [`Validate`] before a payload
//! is built for the remote API. Validation collects *all* violations so a
//! caller can fix a configuration in one pass.

use std::fmt;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path that failed validation (e.g. `rule[0].destination[1].region`).
    pub field: String,
    /// A human-readable description of the validation failure.
    pub message: String,
    /// The kind of validation that failed.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Creates a new validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecr_replication_core::validation::{ValidationError, ValidationErrorKind};
    ///
    /// let error = ValidationError::new(
    ///     "rule[0].destination[0].region",
    ///     "region must not be empty",
    ///     ValidationErrorKind::Empty,
    /// );
    /// assert_eq!(error.kind, ValidationErrorKind::Empty);
    /// ```
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        kind: ValidationErrorKind,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind,
        }
    }

    /// Creates a validation error for an invalid format.
    pub fn format(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, ValidationErrorKind::Format)
    }

    /// Creates a validation error for a value or collection size out of range.
    pub fn range(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, ValidationErrorKind::Range)
    }

    /// Creates a validation error for an empty value or collection.
    pub fn empty(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            message: format!("'{field}' must not be empty"),
            field,
            kind: ValidationErrorKind::Empty,
        }
    }

    /// Creates a validation error for an entry that repeats an earlier one.
    pub fn duplicate(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, ValidationErrorKind::Duplicate)
    }

    /// Creates a validation error for a constraint violation.
    pub fn constraint(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, ValidationErrorKind::Constraint)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The category of validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// The value format is invalid.
    Format,
    /// The value or collection size is outside the allowed range.
    Range,
    /// A value or collection is empty when it shouldn't be.
    Empty,
    /// An entry repeats an earlier entry of the same collection.
    Duplicate,
    /// A remote API constraint was violated.
    Constraint,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format => write!(f, "format"),
            Self::Range => write!(f, "range"),
            Self::Empty => write!(f, "empty"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Constraint => write!(f, "constraint"),
        }
    }
}

/// A collection of validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates an empty validation errors collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a validation error to the collection.
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Returns true if there are no validation errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of validation errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns an iterator over the validation errors.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Returns true if any error has the given kind.
    #[must_use]
    pub fn contains_kind(&self, kind: ValidationErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// Converts to a Result, returning `Ok(())` if no errors.
    ///
    /// # Errors
    ///
    /// Returns the whole collection if it holds at least one error.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "no validation errors")
        } else if self.errors.len() == 1 {
            write!(f, "{}", self.errors[0])
        } else {
            writeln!(f, "{} validation errors:", self.errors.len())?;
            for error in &self.errors {
                writeln!(f, "  - {error}")?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Trait for types that can be validated.
///
/// Implementations report every violation they find rather than stopping at
/// the first one.
pub trait Validate {
    /// Validates this instance and returns any errors found.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` containing all validation failures found.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Returns true if this instance is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_empty() {
        let error = ValidationError::empty("rule[0].destination");
        assert_eq!(error.field, "rule[0].destination");
        assert_eq!(error.kind, ValidationErrorKind::Empty);
        assert!(error.message.contains("must not be empty"));
    }

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::format("rule[0].destination[0].region", "bad region");
        let display = format!("{error}");
        assert!(display.contains("rule[0].destination[0].region"));
        assert!(display.contains("bad region"));
    }

    #[test]
    fn test_validation_errors_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::duplicate("rule[0].destination[1]", "dup"));
        let errors = errors.into_result().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_kind(ValidationErrorKind::Duplicate));
    }

    #[test]
    fn test_validation_errors_display_multiple() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::empty("field1"));
        errors.add(ValidationError::format("field2", "bad"));

        let display = format!("{errors}");
        assert!(display.contains("2 validation errors"));
        assert!(display.contains("field1"));
        assert!(display.contains("field2"));
    }

    #[test]
    fn test_validation_error_kind_display() {
        assert_eq!(ValidationErrorKind::Format.to_string(), "format");
        assert_eq!(ValidationErrorKind::Duplicate.to_string(), "duplicate");
        assert_eq!(ValidationErrorKind::Constraint.to_string(), "constraint");
    }
}

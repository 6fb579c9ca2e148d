//! Field-level constraint checking.

use serde::Serialize;

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

/// All constraints that failed for one value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} constraint violation(s)", .0.len())]
pub struct ValidationErrors(pub Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|violation| violation.field == field)
    }
}

/// Types that check their own field constraints.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Accumulates violations across several field checks.
#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violation(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.violations.push(Violation {
            field: field.to_string(),
            message: message.into(),
        });
        self
    }

    /// Fails when `value` is empty or whitespace only.
    pub fn not_blank(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.violation(field, message);
        }
        self
    }

    /// Fails when `value` has fewer than `min` or more than `max` characters.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let count = value.chars().count();
        if count < min {
            self.violation(
                field,
                format!("{field} must be at least {min} character(s) long"),
            );
        } else if count > max {
            self.violation(field, format!("{field} must not exceed {max} characters"));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(std::mem::take(&mut self.violations)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_short_values_both_fail() {
        let errors = Validator::new()
            .not_blank("title", "  ", "title is required")
            .length("title", "", 1, 255)
            .finish()
            .unwrap_err();

        assert_eq!(errors.violations().len(), 2);
        assert_eq!(errors.violations()[0].message, "title is required");
        assert!(errors.has_field("title"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let accented = "é".repeat(255);
        assert!(Validator::new()
            .length("title", &accented, 1, 255)
            .finish()
            .is_ok());

        let errors = Validator::new()
            .length("title", &"a".repeat(300), 1, 255)
            .finish()
            .unwrap_err();
        assert_eq!(
            errors.violations()[0].message,
            "title must not exceed 255 characters"
        );
    }

    #[test]
    fn display_counts_violations() {
        let errors = ValidationErrors(vec![Violation {
            field: "title".to_string(),
            message: "required".to_string(),
        }]);
        assert_eq!(errors.to_string(), "1 constraint violation(s)");
    }
}

//! Validation utilities for motion-assess
//!
//! Range and consistency checks shared by the configuration structs.
//! Limits come from the config constants module.

use thiserror::Error;

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of valid range
    #[error("Field '{field}' value '{value}' is out of range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    /// Required field missing
    #[error("Required field '{0}' is missing")]
    RequiredFieldMissing(String),

    /// Cross-field validation failure
    #[error("Constraint violation for fields [{}]: {message}", .fields.join(", "))]
    ConstraintViolation { fields: Vec<String>, message: String },

    /// Custom validation failure
    #[error("Validation error: {0}")]
    Custom(String),
}

/// Check `value` lies in `[min, max]`
pub fn validate_range<T>(field: &str, value: T, min: T, max: T) -> ValidationResult<()>
where
    T: PartialOrd + ToString + Copy,
{
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Check a distance is a finite, strictly positive number no larger than `max`
pub fn validate_positive_distance(field: &str, value: f32, max: f32) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: "0 (exclusive)".to_string(),
            max: max.to_string(),
        });
    }
    Ok(())
}

/// Check a `(near, far)` depth zone is ordered and non-negative
pub fn validate_zone(field: &str, near: f32, far: f32) -> ValidationResult<()> {
    if !near.is_finite() || !far.is_finite() || near < 0.0 || near >= far {
        return Err(ValidationError::ConstraintViolation {
            fields: vec![format!("{}.near_m", field), format!("{}.far_m", field)],
            message: format!("zone must satisfy 0 <= near < far, got [{}, {}]", near, far),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert!(validate_range("frames", 20usize, 2, 600).is_ok());
        let err = validate_range("frames", 1usize, 2, 600).unwrap_err();
        assert!(err.to_string().contains("frames"));
    }

    #[test]
    fn test_validate_positive_distance() {
        assert!(validate_positive_distance("tol", 0.05, 2.0).is_ok());
        assert!(validate_positive_distance("tol", 0.0, 2.0).is_err());
        assert!(validate_positive_distance("tol", f32::NAN, 2.0).is_err());
        assert!(validate_positive_distance("tol", 3.0, 2.0).is_err());
    }

    #[test]
    fn test_validate_zone() {
        assert!(validate_zone("seated", 3.9, 4.4).is_ok());
        assert!(validate_zone("seated", 4.4, 3.9).is_err());
        assert!(validate_zone("seated", -1.0, 1.0).is_err());
    }

    #[test]
    fn test_constraint_violation_display() {
        let err = ValidationError::ConstraintViolation {
            fields: vec!["a".to_string(), "b".to_string()],
            message: "broken".to_string(),
        };
        assert_eq!(err.to_string(), "Constraint violation for fields [a, b]: broken");
    }
}

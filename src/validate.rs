//! Form validation that runs before anything reaches a gateway.

use crate::errors::ValidationError;

/// A payload that can be checked for missing or malformed fields.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "is required"))
    } else {
        Ok(())
    }
}

pub fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(field, format!("must be greater than 0, got {}", value)))
    }
}

pub fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require_non_empty(field, value)?;
    let trimmed = value.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::new(field, format!("'{}' is not an email address", trimmed))),
    }
}

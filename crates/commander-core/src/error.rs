use serde::{Deserialize, Serialize};

use crate::error_code::ErrorCode;

/// A single invalid input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Domain failure carrying its own error code
///
/// Without an explicit message the code's default message is used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.message())]
pub struct BusinessError {
    code: ErrorCode,
    message: Option<String>,
}

impl BusinessError {
    pub const fn new(code: ErrorCode) -> Self {
        Self { code, message: None }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Explicit message, or the code's default
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(self.code.message())
    }

    /// Explicit message only
    pub fn explicit_message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl From<ErrorCode> for BusinessError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

/// Explicit validation failure with the offending fields
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed with {} field violation(s)", .violations.len())]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub const fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    /// Failure for exactly one field
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldViolation::new(field, message)])
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }
}

use axum::response::{IntoResponse, Response};
use commander_client::ClientError;
use commander_core::error_code::{FORBIDDEN, INTERNAL_SERVER_ERROR, INVALID_PARAMETERS, UNAUTHORIZED};
use commander_core::{BusinessError, ErrorCode, FieldViolation, ValidationError};

/// One field error reported by request binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Structural binding failure with the field errors that caused it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("binding failed with {} field error(s)", .field_errors.len())]
pub struct BindError {
    field_errors: Vec<FieldError>,
}

impl BindError {
    pub const fn new(field_errors: Vec<FieldError>) -> Self {
        Self { field_errors }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    /// One violation per field error, in the same order
    pub fn violations(&self) -> Vec<FieldViolation> {
        self.field_errors
            .iter()
            .map(|e| FieldViolation::new(e.field.clone(), e.message.clone()))
            .collect()
    }
}

impl From<validator::ValidationErrors> for BindError {
    /// Field errors are ordered by field name, keeping declaration order
    /// within a field. Without an explicit message the rule code is used.
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|(a, _), (b, _)| a.cmp(b));

        let field_errors = fields
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string);
                    FieldError::new(field.as_ref(), message)
                })
            })
            .collect();

        Self { field_errors }
    }
}

/// Failure surfaced by request handling
///
/// Each variant is one row of the failure classification; returning it from
/// a handler or extractor hands it to the exception handler middleware.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Domain failure with its own error code
    #[error(transparent)]
    Business(#[from] BusinessError),

    /// Request binding produced field errors
    #[error(transparent)]
    Bind(#[from] BindError),

    /// Explicit validation failure
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Request body could not be read or decoded
    #[error("{0}")]
    UnreadableBody(String),

    /// Required query parameter is absent
    #[error("{message}")]
    MissingParameter { name: String, message: String },

    /// Query parameter could not be converted to the expected type
    #[error("{message}")]
    TypeMismatch { name: String, message: String },

    /// Authenticated caller lacks permission
    #[error("{}", .0.as_deref().unwrap_or("access denied"))]
    Forbidden(Option<String>),

    /// Missing or invalid credentials
    #[error("{}", .0.as_deref().unwrap_or("authentication required"))]
    Unauthorized(Option<String>),

    /// Anything unexpected; details only reach the log
    #[error(transparent)]
    Internal(anyhow::Error),
}

impl ApiError {
    pub const fn forbidden() -> Self {
        Self::Forbidden(None)
    }

    pub const fn unauthorized() -> Self {
        Self::Unauthorized(None)
    }

    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        Self::Internal(error.into())
    }

    /// Error code this failure resolves to
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Business(e) => e.code(),
            Self::Bind(_)
            | Self::Validation(_)
            | Self::UnreadableBody(_)
            | Self::MissingParameter { .. }
            | Self::TypeMismatch { .. } => INVALID_PARAMETERS,
            Self::Forbidden(_) => FORBIDDEN,
            Self::Unauthorized(_) => UNAUTHORIZED,
            Self::Internal(_) => INTERNAL_SERVER_ERROR,
        }
    }

    /// Resolve into the data the failure envelope is built from
    pub fn classify(&self) -> Failure {
        let (message, violations) = match self {
            Self::Business(e) => (Some(e.message().to_owned()), None),
            Self::Bind(e) => (Some(e.to_string()), Some(e.violations())),
            Self::Validation(e) => (None, Some(e.violations().to_vec())),
            Self::UnreadableBody(message) => (Some(message.clone()), None),
            Self::MissingParameter { name, message } | Self::TypeMismatch { name, message } => (
                Some(message.clone()),
                Some(vec![FieldViolation::new(name.clone(), message.clone())]),
            ),
            Self::Forbidden(message) | Self::Unauthorized(message) => (message.clone(), None),
            Self::Internal(_) => (None, None),
        };

        Failure {
            code: self.error_code(),
            message,
            violations,
            cause: format!("{self:#}"),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Bind(errors.into())
    }
}

impl From<ClientError> for ApiError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Business(e) => Self::Business(e),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let failure = self.classify();

        let mut response = failure.code.status_code().into_response();
        response.extensions_mut().insert(failure);
        response
    }
}

/// Classified failure waiting to be written by the exception handler
#[derive(Debug, Clone)]
pub struct Failure {
    pub code: ErrorCode,
    /// Envelope message; `None` falls back to the code's default
    pub message: Option<String>,
    pub violations: Option<Vec<FieldViolation>>,
    /// Full error chain for the log
    pub cause: String,
}

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use commander_core::error_code::{FORBIDDEN, INTERNAL_SERVER_ERROR, INVALID_PARAMETERS, NOT_FOUND, UNAUTHORIZED};
use commander_core::{ErrorCode, ErrorCodeRegistry, ResponseCodes};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, StatusCode};

use crate::error::{ApiError, Failure};

/// Writes failure envelopes for classified errors
///
/// Installed once on the router. Any response carrying a [`Failure`] is
/// replaced by the JSON envelope for it. Error responses produced outside the
/// handlers (extractor rejections, method mismatches) are classified by
/// status and enveloped as well; successful responses pass through.
#[derive(Debug, Clone)]
pub struct ExceptionHandler {
    codes: ResponseCodes,
    registry: Arc<ErrorCodeRegistry>,
}

impl ExceptionHandler {
    pub const fn new(codes: ResponseCodes, registry: Arc<ErrorCodeRegistry>) -> Self {
        Self { codes, registry }
    }

    pub const fn codes(&self) -> &ResponseCodes {
        &self.codes
    }

    /// Registered name of `code`, if any
    pub fn code_name(&self, code: ErrorCode) -> Option<&'static str> {
        self.registry
            .find(code.code())
            .filter(|(_, registered)| *registered == code)
            .map(|(name, _)| name)
    }

    /// Render the failure envelope and log it
    pub fn render(&self, failure: Failure) -> Response {
        let Failure {
            code,
            message,
            violations,
            cause,
        } = failure;

        let name = self.code_name(code).unwrap_or_else(|| {
            tracing::warn!(code = code.code(), "failure uses an unregistered error code");
            "UNREGISTERED"
        });

        let envelope = commander_core::Response::failed(&self.codes, code, message, violations);
        tracing::error!(
            code = envelope.meta().code(),
            name,
            detail = envelope.meta().message().unwrap_or_default(),
            errors = ?envelope.meta().errors(),
            %cause,
            "request failed"
        );

        let body = serde_json::to_vec(&envelope).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize failure envelope");
            self.minimal_body(code)
        });

        write_json(code, body)
    }

    /// Envelope holding only the code
    fn minimal_body(&self, code: ErrorCode) -> Vec<u8> {
        let code = serde_json::Value::String(self.codes.failure_code(code));
        format!(r#"{{"meta":{{"code":{code}}}}}"#).into_bytes()
    }
}

/// Build a response whose `Content-Length` matches `body` exactly
fn write_json(code: ErrorCode, body: Vec<u8>) -> Response {
    let length = body.len();

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = code.status_code();

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));

    response
}

/// Upper bound when reading the body of an unclassified error response
const REJECTION_BODY_LIMIT: usize = 64 * 1024;

/// Middleware swapping failures for their envelopes
pub async fn handle_failures(State(handler): State<ExceptionHandler>, mut response: Response) -> Response {
    if let Some(failure) = response.extensions_mut().remove::<Failure>() {
        return handler.render(failure);
    }

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let text = match axum::body::to_bytes(response.into_body(), REJECTION_BODY_LIMIT).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_owned(),
        Err(e) => format!("unreadable error body: {e}"),
    };

    handler.render(unclassified(status, &text))
}

/// Classify an error response that no handler classified
///
/// Request rejections keep their text as the message. Anything without a
/// matching code is an internal error, whatever status it carried.
fn unclassified(status: StatusCode, text: &str) -> Failure {
    let code = match status {
        StatusCode::BAD_REQUEST
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNSUPPORTED_MEDIA_TYPE
        | StatusCode::UNPROCESSABLE_ENTITY => INVALID_PARAMETERS,
        StatusCode::UNAUTHORIZED => UNAUTHORIZED,
        StatusCode::FORBIDDEN => FORBIDDEN,
        StatusCode::NOT_FOUND => NOT_FOUND,
        _ => INTERNAL_SERVER_ERROR,
    };

    let message = (code == INVALID_PARAMETERS && !text.is_empty()).then(|| text.to_owned());

    Failure {
        code,
        message,
        violations: None,
        cause: format!("unclassified {status} response: {text}"),
    }
}

/// Panic handler for `CatchPanicLayer`
pub fn panic_response(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    ApiError::internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

/// Fallback for unmatched routes
pub async fn not_found(uri: http::Uri) -> ApiError {
    tracing::debug!(%uri, "no route matched");
    commander_core::BusinessError::new(commander_core::error_code::NOT_FOUND).into()
}

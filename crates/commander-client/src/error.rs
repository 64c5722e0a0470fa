use std::fmt;
use std::sync::OnceLock;

use bytes::Bytes;
use commander_core::BusinessError;

/// Client-specific result type
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors from the REST client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The remote answered with a status classified as a business failure
    #[error(transparent)]
    Business(#[from] BusinessError),

    /// Request body could not be serialized; nothing was sent
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Successful response body did not match the expected type
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Transport failure, including a fired timeout
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    /// Whether the call was abandoned because its timeout fired
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Business classification of a rejected call, if any
    pub const fn business(&self) -> Option<&BusinessError> {
        match self {
            Self::Business(e) => Some(e),
            _ => None,
        }
    }
}

/// Non-success status with the raw body that came with it
///
/// The message `"{status} {body}"` is rendered on first use and cached.
pub struct RestClientError {
    status: u16,
    body: Bytes,
    message: OnceLock<String>,
}

impl RestClientError {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            message: OnceLock::new(),
        }
    }

    pub const fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn message(&self) -> &str {
        self.message
            .get_or_init(|| format!("{} {}", self.status, String::from_utf8_lossy(&self.body)))
    }
}

impl fmt::Debug for RestClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClientError")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RestClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for RestClientError {}

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, RestClientError};

/// Fully read HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    pub const fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    /// Read status, headers and the whole body of a reqwest response
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Self { status, headers, body })
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Decode the body as JSON regardless of status
    pub fn json<R: DeserializeOwned>(&self) -> Result<R, ClientError> {
        serde_json::from_slice(&self.body).map_err(ClientError::Decode)
    }

    /// Keep 2xx responses, turn anything else into a [`RestClientError`]
    pub fn error_for_status(self) -> Result<Self, RestClientError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(RestClientError::new(self.status.as_u16(), self.body))
        }
    }
}

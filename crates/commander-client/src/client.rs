use std::time::Duration;

use bytes::Bytes;
use commander_config::ClientConfig;
use commander_core::BusinessError;
use commander_core::error_code::{INTERNAL_SERVER_ERROR, INVALID_PARAMETERS};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ClientError, Result};
use crate::response::RawResponse;

/// Timeout applied when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Classify a completed call by its HTTP status
///
/// Only `200` is a success. Statuses `400..=500` are the caller's fault,
/// everything else is an internal error. Either way the raw body text
/// becomes the error message.
pub fn classify(status: u16, body: &[u8]) -> std::result::Result<(), BusinessError> {
    let code = match status {
        200 => return Ok(()),
        400..=500 => INVALID_PARAMETERS,
        _ => INTERNAL_SERVER_ERROR,
    };

    Err(BusinessError::with_message(code, String::from_utf8_lossy(body)))
}

/// HTTP client for calling other services with JSON payloads
///
/// Cheap to clone; clones share the connection pool. Every request is
/// abandoned once the client timeout elapses.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl RestClient {
    /// Client with the default timeout
    ///
    /// Fails when the underlying HTTP client cannot be built, for example
    /// when the TLS backend does not initialize.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::from_client(http, DEFAULT_TIMEOUT))
    }

    /// Client configured from the `[client]` section
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let timeout = config.timeout_duration()?;
        Ok(Self::new()?.with_timeout(timeout))
    }

    /// Wrap an existing reqwest client
    pub const fn from_client(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `GET` returning the raw response
    pub async fn get(&self, uri: &Url, headers: Option<&HeaderMap>) -> Result<RawResponse> {
        tracing::info!(%uri, "GET request");
        self.send(self.request(Method::GET, uri, headers)).await
    }

    /// `GET` decoding a `200` body into `R`
    pub async fn get_for_object<R>(&self, uri: &Url, headers: Option<&HeaderMap>) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self.get(uri, headers).await?;
        Self::decode(uri, &response)
    }

    /// `PUT` with an optional JSON body, returning the raw response
    ///
    /// `None` sends the request without a body.
    pub async fn put<T>(&self, uri: &Url, headers: Option<&HeaderMap>, body: Option<&T>) -> Result<RawResponse>
    where
        T: Serialize + ?Sized,
    {
        let mut builder = self.request(Method::PUT, uri, headers);
        if let Some(body) = body {
            let payload = encode(body)?;
            tracing::info!(%uri, body = %String::from_utf8_lossy(&payload), "PUT request");
            builder = with_json(builder, payload, headers);
        } else {
            tracing::info!(%uri, "PUT request");
        }

        self.send(builder).await
    }

    /// `PUT` decoding a `200` body into `R`
    pub async fn put_for_object<T, R>(&self, uri: &Url, headers: Option<&HeaderMap>, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.put(uri, headers, Some(body)).await?;
        Self::decode(uri, &response)
    }

    /// `POST` with a JSON body, returning the raw response
    pub async fn post<T>(&self, uri: &Url, headers: Option<&HeaderMap>, body: &T) -> Result<RawResponse>
    where
        T: Serialize + ?Sized,
    {
        let payload = encode(body)?;
        tracing::info!(%uri, body = %String::from_utf8_lossy(&payload), "POST request");

        let builder = with_json(self.request(Method::POST, uri, headers), payload, headers);
        self.send(builder).await
    }

    /// `POST` with a pre-encoded body sent as-is
    pub async fn post_bytes(
        &self,
        uri: &Url,
        headers: Option<&HeaderMap>,
        body: impl Into<Bytes>,
    ) -> Result<RawResponse> {
        let body = body.into();
        tracing::info!(%uri, len = body.len(), "POST request");

        self.send(self.request(Method::POST, uri, headers).body(body)).await
    }

    /// `POST` decoding a `200` body into `R`
    pub async fn post_for_object<T, R>(&self, uri: &Url, headers: Option<&HeaderMap>, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.post(uri, headers, body).await?;
        Self::decode(uri, &response)
    }

    /// `DELETE` returning the raw response
    pub async fn delete(&self, uri: &Url, headers: Option<&HeaderMap>) -> Result<RawResponse> {
        tracing::info!(%uri, "DELETE request");
        self.send(self.request(Method::DELETE, uri, headers)).await
    }

    fn request(&self, method: Method, uri: &Url, headers: Option<&HeaderMap>) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, uri.clone()).timeout(self.timeout);
        match headers {
            Some(headers) => builder.headers(headers.clone()),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<RawResponse> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, timeout = ?self.timeout, "request failed");
            ClientError::Http(e)
        })?;

        RawResponse::read(response).await.map_err(|e| {
            tracing::error!(error = %e, "failed to read response body");
            ClientError::Http(e)
        })
    }

    fn decode<R>(uri: &Url, response: &RawResponse) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let status = response.status().as_u16();

        if let Err(e) = classify(status, response.body()) {
            tracing::error!(%uri, status, body = %response.text(), "request rejected");
            return Err(e.into());
        }

        tracing::info!(%uri, status, body = %response.text(), "request succeeded");
        response.json()
    }
}

/// Serialize a request body before anything is sent
fn encode<T>(body: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    serde_json::to_vec(body).map_err(|e| {
        tracing::error!(error = %e, "failed to encode request body");
        ClientError::Encode(e)
    })
}

/// Attach a JSON payload, keeping a caller supplied content type
fn with_json(
    builder: reqwest::RequestBuilder,
    payload: Vec<u8>,
    headers: Option<&HeaderMap>,
) -> reqwest::RequestBuilder {
    let builder = builder.body(payload);
    if headers.is_some_and(|h| h.contains_key(CONTENT_TYPE)) {
        builder
    } else {
        builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
    }
}

use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;

use axum::extract::path::ErrorKind;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, RawPathParams, Request};
use commander_core::PagingRequest;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{ApiError, BindError};

/// Body limit used when the server did not configure one (1 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 1 << 20;

/// Page size used when the request names none
pub const DEFAULT_PAGE_SIZE: i32 = 20;

/// Maximum JSON body size, installed as a request extension by the server
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

/// JSON request body
///
/// A wrong content type, an oversized or unreadable body and malformed JSON
/// are all reported as an unreadable body.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(request.headers()) {
            return Err(ApiError::UnreadableBody(
                "Unsupported Content-Type, expected: 'Content-Type: application/json'".to_owned(),
            ));
        }

        let limit = request
            .extensions()
            .get::<BodyLimit>()
            .map_or(DEFAULT_BODY_LIMIT, |limit| limit.0);

        let bytes = axum::body::to_bytes(request.into_body(), limit).await.map_err(|err| {
            if std::error::Error::source(&err).is_some_and(|source| source.is::<http_body_util::LengthLimitError>()) {
                ApiError::UnreadableBody(format!("Request body is too large, limit is {limit} bytes"))
            } else {
                ApiError::UnreadableBody(format!("Failed to read request body: {err}"))
            }
        })?;

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|err| ApiError::UnreadableBody(format!("JSON parse error: {err}")))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// JSON request body that must also pass its validation rules
///
/// Rule violations are reported as a bind failure, one violation per field
/// error.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(request, state).await?;
        value.validate().map_err(BindError::from)?;
        Ok(Self(value))
    }
}

/// Query string parameters with typed access
///
/// Extraction never fails; conversion errors surface when a parameter is
/// read, naming the parameter involved.
#[derive(Debug, Clone, Default)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn from_query(query: &str) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(query.as_bytes()).into_owned().collect(),
        }
    }

    /// First raw value of `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parse a parameter that must be present
    pub fn required<T>(&self, name: &str) -> Result<T, ApiError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.optional(name)?.ok_or_else(|| ApiError::MissingParameter {
            name: name.to_owned(),
            message: format!("Required request parameter '{name}' is not present"),
        })
    }

    /// Parse a parameter that may be absent
    pub fn optional<T>(&self, name: &str) -> Result<Option<T>, ApiError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(name)
            .map(|value| {
                value.parse().map_err(|err| ApiError::TypeMismatch {
                    name: name.to_owned(),
                    message: format!("Failed to convert value '{value}' for parameter '{name}': {err}"),
                })
            })
            .transpose()
    }

    /// Paging request from `page`, `size` and `sort`
    ///
    /// `page` defaults to the first page and `size` to [`DEFAULT_PAGE_SIZE`].
    pub fn paging(&self) -> Result<PagingRequest, ApiError> {
        let page = self.optional::<i32>("page")?.unwrap_or(0);
        let size = self.optional::<i32>("size")?.unwrap_or(DEFAULT_PAGE_SIZE);

        PagingRequest::parse(page, size, self.get("sort")).map_err(ApiError::from)
    }
}

impl<S> FromRequestParts<S> for Params
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.uri.query().map(Self::from_query).unwrap_or_default())
    }
}

/// Typed path parameters
///
/// A segment that does not parse is reported as a type mismatch naming the
/// route parameter. Route and type disagreements are internal errors.
#[derive(Debug, Clone)]
pub struct PathParam<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(PathRejection::FailedToDeserializePathParams(err)) => {
                let names: Vec<String> = RawPathParams::from_request_parts(parts, state)
                    .await
                    .map(|raw| raw.iter().map(|(name, _)| name.to_owned()).collect())
                    .unwrap_or_default();

                Err(path_mismatch(&names, err.kind(), err.body_text()))
            }
            Err(other) => Err(ApiError::internal(anyhow::anyhow!(
                "path parameters unavailable: {}",
                other.body_text()
            ))),
        }
    }
}

fn path_mismatch(names: &[String], kind: &ErrorKind, message: String) -> ApiError {
    let name = match kind {
        ErrorKind::ParseErrorAtKey { key, .. } | ErrorKind::InvalidUtf8InPathParam { key } => Some(key.clone()),
        ErrorKind::ParseErrorAtIndex { index, .. } => names.get(*index).cloned(),
        ErrorKind::ParseError { .. } if names.len() == 1 => names.first().cloned(),
        _ => None,
    };

    match name {
        Some(name) => ApiError::TypeMismatch { name, message },
        None => ApiError::internal(anyhow::anyhow!("path parameters do not fit the route: {message}")),
    }
}

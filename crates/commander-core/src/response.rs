use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BusinessError, FieldViolation};
use crate::error_code::{ErrorCode, OK_CODE};
use crate::paging::Page;

/// Prefix used when no configuration overrides it
pub const DEFAULT_PREFIX: &str = "PMH-";

/// Response code formatting for one process
///
/// Built once from configuration at startup and handed to every envelope
/// factory, so the prefix cannot drift while the process runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCodes {
    prefix: Arc<str>,
    ok_code: Arc<str>,
}

impl ResponseCodes {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        let ok_code = format!("{prefix}{OK_CODE}");

        Self {
            prefix: prefix.into(),
            ok_code: ok_code.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Success sentinel, e.g. `PMH-200`
    pub fn ok_code(&self) -> &str {
        &self.ok_code
    }

    /// Prefixed failure code, e.g. `PMH-4000`
    pub fn failure_code(&self, code: ErrorCode) -> String {
        format!("{}{}", self.prefix, code.code())
    }
}

impl Default for ResponseCodes {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Envelope metadata
///
/// Absent fields are left out of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldViolation>>,
}

impl Metadata {
    fn with_code(code: String) -> Self {
        Self {
            code,
            page: None,
            size: None,
            total: None,
            message: None,
            errors: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub const fn page(&self) -> Option<u32> {
        self.page
    }

    pub const fn size(&self) -> Option<u32> {
        self.size
    }

    pub const fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn errors(&self) -> Option<&[FieldViolation]> {
        self.errors.as_deref()
    }
}

/// Uniform success/failure wrapper returned to API callers
///
/// Serializes as `{"data": ..., "meta": {...}}`. Instances are only built
/// through the factories below: successes carry the OK sentinel and never
/// a message or violations, failures carry a prefixed error code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    meta: Metadata,
}

impl<T> Response<T> {
    /// Successful response wrapping `data`
    pub fn succeeded(codes: &ResponseCodes, data: T) -> Self {
        Self {
            data: Some(data),
            meta: Metadata::with_code(codes.ok_code().to_owned()),
        }
    }

    /// Successful response without data
    pub fn empty(codes: &ResponseCodes) -> Self {
        Self {
            data: None,
            meta: Metadata::with_code(codes.ok_code().to_owned()),
        }
    }

    pub const fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub const fn meta(&self) -> &Metadata {
        &self.meta
    }

    pub fn is_success(&self, codes: &ResponseCodes) -> bool {
        self.meta.code == codes.ok_code()
    }
}

impl<T> Response<Vec<T>> {
    /// Successful response for one page of results
    pub fn paged(codes: &ResponseCodes, page: Page<T>) -> Self {
        let Page {
            content,
            number,
            size,
            total_elements,
        } = page;

        let mut meta = Metadata::with_code(codes.ok_code().to_owned());
        meta.page = Some(number);
        meta.size = Some(size);
        meta.total = Some(total_elements);

        Self {
            data: Some(content),
            meta,
        }
    }
}

impl Response<()> {
    /// Failed response for `code`
    ///
    /// Without `message` the code's default message is used. `errors` is
    /// kept exactly as given, so an empty list still serializes.
    pub fn failed(
        codes: &ResponseCodes,
        code: ErrorCode,
        message: Option<String>,
        errors: Option<Vec<FieldViolation>>,
    ) -> Self {
        let mut meta = Metadata::with_code(codes.failure_code(code));
        meta.message = Some(message.unwrap_or_else(|| code.message().to_owned()));
        meta.errors = errors;

        Self { data: None, meta }
    }

    /// Failed response for a business error
    pub fn from_business_error(codes: &ResponseCodes, error: &BusinessError) -> Self {
        Self::failed(codes, error.code(), Some(error.message().to_owned()), None)
    }
}

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! JSON REST client for service-to-service calls
//!
//! Every call carries a fixed timeout. Typed calls decode `200` bodies and
//! turn every other status into a business error.

mod client;
pub mod error;
mod response;

pub use client::{DEFAULT_TIMEOUT, RestClient, classify};
pub use error::{ClientError, RestClientError, Result};
pub use response::RawResponse;

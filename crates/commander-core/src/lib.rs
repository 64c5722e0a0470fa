#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Shared building blocks for Commander services
//!
//! Error codes and their startup registry, the JSON response envelope,
//! the bean mapping contract and the paging request parser

pub mod error;
pub mod error_code;
pub mod mapper;
pub mod paging;
pub mod response;

pub use error::{BusinessError, FieldViolation, ValidationError};
pub use error_code::{ErrorCode, ErrorCodeRegistry, RegistryError};
pub use mapper::{BeanMapper, MapperError};
pub use paging::{Direction, Order, Page, PagingRequest, Sort};
pub use response::{Metadata, Response, ResponseCodes};

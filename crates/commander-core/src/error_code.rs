use std::collections::HashSet;
use std::fmt;

use http::StatusCode;
use indexmap::IndexMap;

/// Immutable description of a distinguishable failure kind
///
/// The numeric code becomes part of the response `meta.code`, the message is
/// the default human text and the HTTP status is what the exception handler
/// answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    code: u32,
    message: &'static str,
    http_status: u16,
}

impl ErrorCode {
    pub const fn new(code: u32, message: &'static str, http_status: u16) -> Self {
        Self {
            code,
            message,
            http_status,
        }
    }

    /// Numeric code, unique across the registry
    pub const fn code(&self) -> u32 {
        self.code
    }

    /// Default message used when no override is given
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// Raw HTTP status declared for this code
    pub const fn http_status(&self) -> u16 {
        self.http_status
    }

    /// HTTP status as a typed value
    ///
    /// A declared status outside the valid range answers 500.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

pub const INTERNAL_SERVER_ERROR: ErrorCode = ErrorCode::new(5000, "Internal server error", 500);
pub const INVALID_PARAMETERS: ErrorCode = ErrorCode::new(4000, "Invalid parameters", 400);
pub const UNAUTHORIZED: ErrorCode = ErrorCode::new(4001, "You need to login to to access this resource", 401);
pub const FORBIDDEN: ErrorCode = ErrorCode::new(4002, "You don't have permission to to access this resource", 403);
pub const NOT_FOUND: ErrorCode = ErrorCode::new(4004, "Resource not found", 404);

/// Codes every registry starts with, in registration order
pub const BUILTIN: [(&str, ErrorCode); 5] = [
    ("INTERNAL_SERVER_ERROR", INTERNAL_SERVER_ERROR),
    ("INVALID_PARAMETERS", INVALID_PARAMETERS),
    ("UNAUTHORIZED", UNAUTHORIZED),
    ("FORBIDDEN", FORBIDDEN),
    ("NOT_FOUND", NOT_FOUND),
];

/// Suffix of the success sentinel; a failure code equal to it would be
/// indistinguishable from a successful response
pub const OK_CODE: u32 = 200;

/// Registry construction failures, all fatal at startup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two or more entries share a numeric code
    #[error("found error code duplication: {codes:?}")]
    DuplicateCodes {
        /// Every repeated code, once per repeat
        codes: Vec<u32>,
    },

    /// The same name was registered twice
    #[error("error code name registered twice: {name}")]
    DuplicateName { name: String },

    /// An entry uses the success sentinel code
    #[error("error code {name} uses the reserved success code {}", OK_CODE)]
    ReservedCode { name: String },
}

/// Named error codes known to the process
///
/// Built once at startup from the built-ins plus whatever codes the
/// features declare. Read-only afterwards, so it can be shared freely.
#[derive(Debug, Clone)]
pub struct ErrorCodeRegistry {
    entries: IndexMap<&'static str, ErrorCode>,
}

impl ErrorCodeRegistry {
    /// Build a registry from the built-ins followed by `extra`
    pub fn new<I>(extra: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (&'static str, ErrorCode)>,
    {
        Self::from_entries(BUILTIN.into_iter().chain(extra))
    }

    /// Build a registry from exactly the given entries
    ///
    /// All numeric code duplicates are collected before failing so the
    /// startup error names every offender at once.
    pub fn from_entries<I>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (&'static str, ErrorCode)>,
    {
        let mut by_name = IndexMap::new();
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();

        for (name, code) in entries {
            if code.code() == OK_CODE {
                return Err(RegistryError::ReservedCode { name: name.to_owned() });
            }

            if by_name.insert(name, code).is_some() {
                return Err(RegistryError::DuplicateName { name: name.to_owned() });
            }

            if !seen.insert(code.code()) {
                duplicates.push(code.code());
            }
        }

        if !duplicates.is_empty() {
            return Err(RegistryError::DuplicateCodes { codes: duplicates });
        }

        Ok(Self { entries: by_name })
    }

    /// Registry holding only the built-in codes
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new([])
    }

    /// Look up a code by its registered name
    pub fn get(&self, name: &str) -> Option<ErrorCode> {
        self.entries.get(name).copied()
    }

    /// Look up a name and code by numeric code
    pub fn find(&self, code: u32) -> Option<(&'static str, ErrorCode)> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.code() == code)
            .map(|(name, entry)| (*name, *entry))
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ErrorCode)> + '_ {
        self.entries.iter().map(|(name, code)| (*name, *code))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

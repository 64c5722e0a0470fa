use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Field name reported for every paging violation
const PAGE_FIELD: &str = "page";

/// Sort direction of a single order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort direction: {0}")]
pub struct UnknownDirection(pub String);

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(UnknownDirection(other.to_owned())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("ASC"),
            Self::Desc => f.write_str("DESC"),
        }
    }
}

/// One `property:DIRECTION` sort entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    property: String,
    direction: Direction,
}

impl Order {
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

/// Ordered list of sort entries; empty means unsorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub const fn unsorted() -> Self {
        Self { orders: Vec::new() }
    }

    pub const fn by(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Parse repeated `field:ASC|DESC` tokens separated by commas
    ///
    /// Tokens are taken contiguously from the start of the input; parsing
    /// stops silently at the first position that does not match.
    pub fn parse(spec: &str) -> Self {
        fn order_pattern() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            // Group 1: field name, group 2: direction, then commas or end of input
            RE.get_or_init(|| Regex::new(r"^([A-Za-z0-9_]+):(ASC|DESC)(?:,+|$)").expect("must be valid regex"))
        }

        let mut orders = Vec::new();
        let mut rest = spec;

        while let Some(captures) = order_pattern().captures(rest) {
            let (Some(token), Some(field), Some(direction)) = (captures.get(0), captures.get(1), captures.get(2))
            else {
                break;
            };
            let Ok(direction) = direction.as_str().parse() else {
                break;
            };

            orders.push(Order::new(field.as_str(), direction));
            rest = &rest[token.end()..];
        }

        Self { orders }
    }
}

/// Validated paging request
///
/// Only obtainable through [`PagingRequest::parse`], so the page index is
/// never negative and the page size never below one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingRequest {
    page_index: u32,
    page_size: u32,
    sort: Sort,
}

impl PagingRequest {
    /// Validate raw paging input
    ///
    /// Fails with a `page` field violation when the index is negative or the
    /// size is below one. A missing sort spec means unsorted.
    pub fn parse(page_index: i32, page_size: i32, sort: Option<&str>) -> Result<Self, ValidationError> {
        let Ok(index) = u32::try_from(page_index) else {
            return Err(ValidationError::single(
                PAGE_FIELD,
                format!("Page index: {page_index} less then zero"),
            ));
        };

        let size = match u32::try_from(page_size) {
            Ok(size) if size >= 1 => size,
            _ => {
                return Err(ValidationError::single(
                    PAGE_FIELD,
                    format!("Page index: {page_index} less then one"),
                ));
            }
        };

        Ok(Self {
            page_index: index,
            page_size: size,
            sort: sort.map_or_else(Sort::unsorted, Sort::parse),
        })
    }

    pub const fn page_index(&self) -> u32 {
        self.page_index
    }

    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub const fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Number of rows to skip before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index) * u64::from(self.page_size)
    }
}

/// One page of results together with its position in the full set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub const fn new(content: Vec<T>, number: u32, size: u32, total_elements: u64) -> Self {
        Self {
            content,
            number,
            size,
            total_elements,
        }
    }

    /// Page answering `request`
    pub const fn for_request(content: Vec<T>, request: &PagingRequest, total_elements: u64) -> Self {
        Self::new(content, request.page_index, request.page_size, total_elements)
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }
}

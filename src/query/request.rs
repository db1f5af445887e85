//! Client request parsing.
//!
//! A request is one JSON document:
//!
//! ```text
//! {"query": {"region": "<string>", "date": "<string>"}}
//! ```
//!
//! Either field may be missing, `null` or empty. A non-empty `date` wins over
//! `region`; only one filter token is ever used per request. Keys match
//! case-insensitively (`"Query"`, `"REGION"`), preferring an exact match.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a request was rejected.
#[derive(Debug, Error)]
pub enum InvalidRequest {
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("query has neither date nor region")]
    EmptyQuery,
}

type Object = Map<String, Value>;

/// Member `name` of `object`; an exact key wins over a case-insensitive one.
fn member<'a>(object: &'a Object, name: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// String member `name`; missing and `null` read as empty.
fn text_member(object: &Object, name: &str) -> Result<String, serde_json::Error> {
    match member(object, name) {
        Some(value) => Ok(Option::<String>::deserialize(value)?.unwrap_or_default()),
        None => Ok(String::new()),
    }
}

/// Which request field supplied the filter token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    Date,
    Region,
}

impl FilterSource {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterSource::Date => "date",
            FilterSource::Region => "region",
        }
    }
}

/// The single filter token extracted from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub filter: String,
    pub source: FilterSource,
}

impl Query {
    /// Parse a raw request into a query.
    pub fn parse(bytes: &[u8]) -> Result<Self, InvalidRequest> {
        let body: Object = serde_json::from_slice(bytes)?;
        let fields = match member(&body, "query") {
            Some(value) => Option::<Object>::deserialize(value)?.unwrap_or_default(),
            None => Object::new(),
        };

        let date = text_member(&fields, "date")?;
        let region = text_member(&fields, "region")?;

        if !date.is_empty() {
            return Ok(Self {
                filter: date,
                source: FilterSource::Date,
            });
        }

        if !region.is_empty() {
            return Ok(Self {
                filter: region,
                source: FilterSource::Region,
            });
        }

        Err(InvalidRequest::EmptyQuery)
    }
}

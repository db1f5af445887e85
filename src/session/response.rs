//! Response encoding.
//!
//! # Wire Format
//! ```text
//! Invalid Input                  (no terminator)
//! Nothing found\n
//! [\n {\n  "cumulativeTestPositive": "...",\n  ...\n }\n]\n
//! ```
//!
//! Record arrays are pretty-printed with a one-space indent.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::store::Record;

/// Greeting written once when a connection is accepted.
pub const GREETING: &[u8] = b"Connected...\nUsage: JSON format input only\n";

/// Reply to a request that is not valid JSON or names no filter.
pub const INVALID_INPUT: &[u8] = b"Invalid Input";

/// Reply to a valid request that matched nothing.
pub const NOTHING_FOUND: &[u8] = b"Nothing found\n";

/// The reply to one request.
#[derive(Debug)]
pub enum Response<'s> {
    InvalidInput,
    NothingFound,
    Records(Vec<&'s Record>),
}

impl Response<'_> {
    /// Label used in logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Response::InvalidInput => "invalid",
            Response::NothingFound => "nothing_found",
            Response::Records(_) => "records",
        }
    }

    /// Encode the response into the exact bytes written to the client.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Response::InvalidInput => Ok(INVALID_INPUT.to_vec()),
            Response::NothingFound => Ok(NOTHING_FOUND.to_vec()),
            Response::Records(records) => {
                let mut out = Vec::with_capacity(records.len() * 256);
                let formatter = PrettyFormatter::with_indent(b" ");
                let mut serializer = Serializer::with_formatter(&mut out, formatter);
                records.serialize(&mut serializer)?;
                out.push(b'\n');
                Ok(out)
            }
        }
    }
}

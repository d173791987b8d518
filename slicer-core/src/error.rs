//! Error types for document edits

use std::fmt;
use thiserror::Error;

use crate::slice::Disposition;

/// Which side of a selected range a leftover fragment sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Leading,
    Trailing,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Leading => f.write_str("leading"),
            Side::Trailing => f.write_str("trailing"),
        }
    }
}

/// Rejected edit. The document is unchanged whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SliceError {
    #[error("Invalid range {start}..={end} for section {id}")]
    InvalidRange { id: usize, start: usize, end: usize },

    #[error("Sections {first} and {second} are not adjacent")]
    Adjacency { first: usize, second: usize },

    #[error("Unknown section {id} (document has {len} sections)")]
    UnknownSection { id: usize, len: usize },

    #[error("The {side} fragment needs a valid disposition (got {rejected:?})")]
    DispositionRequired {
        side: Side,
        rejected: Option<Disposition>,
    },

    #[error("Slice plan is stale (planned at revision {planned}, document is at {current})")]
    StalePlan { planned: u64, current: u64 },
}

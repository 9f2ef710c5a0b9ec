//! Error types for document model operations

use crate::{BookmarkNameError, PropertyKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocModelError {
    #[error("Invalid range: start {start}, end {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("{kind:?} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        kind: PropertyKind,
        index: usize,
        len: usize,
    },

    #[error("Offset {offset} out of bounds (len {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("Coverage violation in {kind:?} table: {detail}")]
    CoverageViolation { kind: PropertyKind, detail: String },

    #[error("{kind:?} table is empty")]
    EmptyTable { kind: PropertyKind },

    #[error("Malformed sprm: {0}")]
    MalformedSprm(String),

    #[error("Malformed table row at [{start}, {end}): found {found} cells, expected {expected}")]
    MalformedTable {
        start: usize,
        end: usize,
        found: usize,
        expected: usize,
    },

    #[error("Bookmark index {index} out of bounds (len {len})")]
    BookmarkOutOfBounds { index: usize, len: usize },

    #[error("Invalid bookmark name: {0}")]
    InvalidBookmarkName(#[from] BookmarkNameError),

    #[error("Invalid builder input: {0}")]
    InvalidBuilder(String),

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocModelError>;

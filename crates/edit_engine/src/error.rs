//! Error types for range and editing operations

use crate::RangeId;
use doc_model::PropertyKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Unknown or released range {0:?}")]
    UnknownRange(RangeId),

    #[error("Invalid range: start {start}, end {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("Range [{start}, {end}) lies outside its parent [{parent_start}, {parent_end})")]
    OutsideParent {
        start: usize,
        end: usize,
        parent_start: usize,
        parent_end: usize,
    },

    #[error("{kind:?} index {index} out of bounds (range holds {len})")]
    IndexOutOfBounds {
        kind: PropertyKind,
        index: usize,
        len: usize,
    },

    #[error("{what} {index} out of bounds ({len} available)")]
    TableIndexOutOfBounds {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Paragraph at {0} doesn't belong to a table")]
    NotInTable(usize),

    #[error("Paragraph at {0} is not the first one in its table")]
    NotFirstInTable(usize),

    #[error("Paragraph is not a child of range {0:?}")]
    NotChildOfRange(RangeId),

    #[error("Inconsistent range: {0}")]
    InconsistentRange(String),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),
}

pub type Result<T> = std::result::Result<T, EditError>;

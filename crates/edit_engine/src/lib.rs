//! Edit Engine - Range views, typed ranges, and structural editing
//!
//! A [`DocumentEditor`] owns a document and hands out [`RangeId`] handles to
//! views over `[start, end)` spans of it. Views resolve the property nodes
//! they overlap lazily, derive typed views (sections, paragraphs, runs,
//! tables, list entries) and perform inserts and deletes that repair the
//! offsets of every table and every ancestor view.

mod error;
mod range;
mod editor;
mod editing;
mod typed;
mod paragraph;
mod character_run;
mod section;
mod list_entry;
mod table;

pub use error::*;
pub use range::{RangeId, RangeKind};
pub use editor::*;
pub use typed::*;
pub use paragraph::*;
pub use character_run::*;
pub use section::*;
pub use list_entry::*;
pub use table::*;

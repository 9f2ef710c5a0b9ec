//! Document Model - property tables over a character-position text store
//!
//! This crate provides the storage side of a binary word-processor document:
//! the ordered property tables for sections, paragraphs, character runs and
//! text pieces, the sprm codec their payloads use, decoded property records,
//! and the auxiliary indexes (styles, lists, stories, fields, bookmarks).

mod error;
mod property;
mod text;
pub mod sprm;
mod border;
mod paragraph;
mod run;
pub mod section;
pub mod table;
pub mod style;
pub mod list;
mod story;
pub mod field;
mod bookmark;
mod settings;
mod document;

pub use error::*;
pub use property::*;
pub use text::*;
pub use sprm::{SprmBuffer, SprmOperation};
pub use border::*;
pub use paragraph::*;
pub use run::*;
pub use section::*;
pub use table::*;
pub use style::*;
pub use list::*;
pub use story::*;
pub use field::*;
pub use bookmark::*;
pub use settings::*;
pub use document::*;

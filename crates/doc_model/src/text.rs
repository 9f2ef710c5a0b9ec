//! Text pieces - the raw characters behind the property tables
//!
//! Character positions count Unicode scalar values, so a piece's span length
//! always equals `text.chars().count()`.

use crate::{NodePayload, PropertyKind, PropertyNode, PropertyTable, Result};
use serde::{Deserialize, Serialize};

/// Paragraph mark
pub const PARAGRAPH_MARK: char = '\r';
/// Terminates a table cell (and, with the row-end flag, a table row)
pub const CELL_MARK: char = '\u{0007}';
/// Section break inside the main story
pub const SECTION_MARK: char = '\u{000C}';

/// The text behind one node of the text table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPiece {
    text: String,
}

impl TextPiece {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in character positions
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Substring by piece-relative character offsets
    pub fn slice(&self, from: usize, to: usize) -> &str {
        let start = byte_offset(&self.text, from);
        let end = byte_offset(&self.text, to);
        &self.text[start..end]
    }

    /// Insert at a piece-relative character offset
    pub fn insert_str(&mut self, at: usize, text: &str) {
        let at = byte_offset(&self.text, at);
        self.text.insert_str(at, text);
    }
}

impl NodePayload for TextPiece {
    fn remove_span(&mut self, from: usize, to: usize) {
        let start = byte_offset(&self.text, from);
        let end = byte_offset(&self.text, to);
        self.text.replace_range(start..end, "");
    }

    fn split_off(&mut self, at: usize) -> Self {
        let at = byte_offset(&self.text, at);
        Self {
            text: self.text.split_off(at),
        }
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// The document's text table
pub type TextTable = PropertyTable<TextPiece>;

impl PropertyTable<TextPiece> {
    /// Build a text table from consecutive pieces
    pub fn from_pieces<I, S>(pieces: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cp = 0;
        let mut nodes = Vec::new();
        for text in pieces {
            let piece = TextPiece::new(text);
            let len = piece.char_len();
            nodes.push(PropertyNode::new(cp, cp + len, piece)?);
            cp += len;
        }
        PropertyTable::from_nodes(PropertyKind::Text, nodes)
    }

    /// Insert `text` at `cp` into the piece at `index` and grow that piece.
    /// Returns the number of character positions inserted.
    pub fn insert_text(&mut self, index: usize, cp: usize, text: &str) -> Result<usize> {
        let (start, end) = {
            let node = self.node(index)?;
            (node.start(), node.end())
        };
        if cp < start || cp > end {
            return Err(crate::DocModelError::OffsetOutOfBounds {
                offset: cp,
                len: end,
            });
        }
        let length = text.chars().count();
        self.payload_mut(index)?.insert_str(cp - start, text);
        self.adjust_for_insert(index, length)?;
        Ok(length)
    }

    /// Text of `[start, end)` using the pieces in the index window `[from, to)`
    pub fn text_in_window(&self, from: usize, to: usize, start: usize, end: usize) -> String {
        let mut out = String::new();
        for node in self.nodes()[from.min(self.len())..to.min(self.len())].iter() {
            let piece_start = start.max(node.start());
            let piece_end = end.min(node.end());
            if piece_start >= piece_end {
                continue;
            }
            out.push_str(
                node.payload()
                    .slice(piece_start - node.start(), piece_end - node.start()),
            );
        }
        out
    }

    /// Full text of the table
    pub fn full_text(&self) -> String {
        self.iter().map(|n| n.payload().as_str()).collect()
    }
}

//! Typed access to ranges
//!
//! Every typed view (paragraph, run, section, table parts, list entry) wraps a
//! [`RangeId`]; [`TextRange`] gives them the common span and text reads.

use crate::{CharacterRun, DocumentEditor, Paragraph, RangeId, RangeKind, Result, Section};
use doc_model::PropertyKind;

/// Span and text reads shared by every view
pub trait TextRange {
    fn range_id(&self) -> RangeId;

    fn start(&self, editor: &DocumentEditor) -> Result<usize> {
        editor.start(self.range_id())
    }

    fn end(&self, editor: &DocumentEditor) -> Result<usize> {
        editor.end(self.range_id())
    }

    fn text(&self, editor: &DocumentEditor) -> Result<String> {
        editor.text(self.range_id())
    }

    fn num_sections(&self, editor: &DocumentEditor) -> Result<usize> {
        editor.num_sections(self.range_id())
    }

    fn num_paragraphs(&self, editor: &DocumentEditor) -> Result<usize> {
        editor.num_paragraphs(self.range_id())
    }

    fn num_character_runs(&self, editor: &DocumentEditor) -> Result<usize> {
        editor.num_character_runs(self.range_id())
    }
}

impl TextRange for RangeId {
    fn range_id(&self) -> RangeId {
        *self
    }
}

/// A node of any property table, viewed through a range
#[derive(Debug, Clone, PartialEq)]
pub enum TypedRange {
    Section(Section),
    Paragraph(Paragraph),
    CharacterRun(CharacterRun),
    /// A raw text piece
    TextPiece(RangeId),
}

impl TypedRange {
    pub fn kind(&self) -> PropertyKind {
        match self {
            TypedRange::Section(_) => PropertyKind::Section,
            TypedRange::Paragraph(_) => PropertyKind::Paragraph,
            TypedRange::CharacterRun(_) => PropertyKind::CharacterRun,
            TypedRange::TextPiece(_) => PropertyKind::Text,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            TypedRange::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            TypedRange::Section(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_character_run(&self) -> Option<&CharacterRun> {
        match self {
            TypedRange::CharacterRun(r) => Some(r),
            _ => None,
        }
    }
}

impl TextRange for TypedRange {
    fn range_id(&self) -> RangeId {
        match self {
            TypedRange::Section(s) => s.range_id(),
            TypedRange::Paragraph(p) => p.range_id(),
            TypedRange::CharacterRun(r) => r.range_id(),
            TypedRange::TextPiece(id) => *id,
        }
    }
}

impl DocumentEditor {
    /// The `index`-th node of `kind` overlapping the range, as a typed view
    pub fn get(&mut self, id: RangeId, kind: PropertyKind, index: usize) -> Result<TypedRange> {
        match kind {
            PropertyKind::Section => self.section(id, index).map(TypedRange::Section),
            PropertyKind::Paragraph => self.paragraph(id, index).map(TypedRange::Paragraph),
            PropertyKind::CharacterRun => {
                self.character_run(id, index).map(TypedRange::CharacterRun)
            }
            PropertyKind::Text => {
                let node = self.node_index(id, kind, index)?;
                let (start, end) = self.clipped_span(id, kind, node)?;
                self.child(id, start, end, RangeKind::TextPiece)
                    .map(TypedRange::TextPiece)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::DocumentBuilder;

    #[test]
    fn test_get_dispatches_on_kind() {
        let doc = DocumentBuilder::new()
            .paragraph("one")
            .paragraph("two")
            .build()
            .unwrap();
        let mut ed = DocumentEditor::new(doc);
        let all = ed.overall_range();

        let para = ed.get(all, PropertyKind::Paragraph, 1).unwrap();
        assert_eq!(para.kind(), PropertyKind::Paragraph);
        assert!(para.as_paragraph().is_some());
        assert_eq!(para.text(&ed).unwrap(), "two\r");

        let piece = ed.get(all, PropertyKind::Text, 0).unwrap();
        assert!(matches!(piece, TypedRange::TextPiece(_)));
        assert_eq!(piece.end(&ed).unwrap(), 4);

        let section = ed.get(all, PropertyKind::Section, 0).unwrap();
        assert_eq!(section.num_paragraphs(&ed).unwrap(), 2);
        assert!(section.as_character_run().is_none());

        assert!(ed.get(all, PropertyKind::CharacterRun, 5).is_err());
    }

    #[test]
    fn test_range_id_is_a_text_range() {
        let doc = DocumentBuilder::new().paragraph("abc").build().unwrap();
        let mut ed = DocumentEditor::new(doc);
        let all = ed.overall_range();
        assert_eq!(TextRange::text(&all, &ed).unwrap(), "abc\r");
        assert_eq!(all.num_character_runs(&ed).unwrap(), 1);
    }
}

//! ListEntry - a paragraph that belongs to a list

use crate::{DocumentEditor, Paragraph, RangeId, RangeKind, Result, TextRange};
use doc_model::{ListLevel, NumberFormat};

/// A list paragraph together with the list level it resolves to
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    paragraph: Paragraph,
    level: Option<ListLevel>,
}

impl DocumentEditor {
    /// The `index`-th paragraph of the range, viewed as a list entry
    pub fn list_entry(&mut self, id: RangeId, index: usize) -> Result<ListEntry> {
        let paragraph = self.paragraph_as(id, index, RangeKind::ListEntry)?;
        let (ilfo, ilvl) = (paragraph.ilfo(), paragraph.ilvl());
        let level = if paragraph.is_in_list() {
            let level = self.doc.lists().level(ilfo, ilvl);
            if level.is_none() {
                tracing::warn!("no list level for ilfo {} ilvl {}", ilfo, ilvl);
            }
            level
        } else {
            None
        };
        Ok(ListEntry { paragraph, level })
    }
}

impl ListEntry {
    pub fn range_id(&self) -> RangeId {
        self.paragraph.range_id()
    }

    pub fn paragraph(&self) -> &Paragraph {
        &self.paragraph
    }

    pub fn paragraph_mut(&mut self) -> &mut Paragraph {
        &mut self.paragraph
    }

    /// Resolved list level; `None` when the paragraph's list is missing
    pub fn level(&self) -> Option<&ListLevel> {
        self.level.as_ref()
    }

    pub fn ilfo(&self) -> u16 {
        self.paragraph.ilfo()
    }

    pub fn ilvl(&self) -> u8 {
        self.paragraph.ilvl()
    }

    pub fn number_format(&self) -> Option<NumberFormat> {
        self.level.as_ref().map(|l| l.number_format)
    }

    pub fn start_at(&self) -> Option<u32> {
        self.level.as_ref().map(|l| l.start_at)
    }

    /// Move the entry to another level, re-resolving it
    pub fn set_ilvl(&mut self, editor: &mut DocumentEditor, ilvl: u8) -> Result<()> {
        self.paragraph.set_ilvl(editor, ilvl)?;
        self.level = editor.doc.lists().level(self.paragraph.ilfo(), ilvl);
        Ok(())
    }
}

impl TextRange for ListEntry {
    fn range_id(&self) -> RangeId {
        ListEntry::range_id(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{DocumentBuilder, ListData, ListFormatOverride, ListTables};

    #[test]
    fn test_list_entry_resolves_level() {
        let mut lists = ListTables::new();
        let numbered = lists.add_list(ListData::numbered(7));
        let mut restart = ListFormatOverride::new(7);
        restart.start_overrides.insert(1, 5);
        let restarted = lists.add_override(restart);

        let doc = DocumentBuilder::new()
            .lists(lists)
            .list_paragraph(numbered, 0, "first")
            .list_paragraph(restarted, 1, "second")
            .paragraph("plain")
            .list_paragraph(9, 0, "orphan")
            .build()
            .unwrap();
        let mut ed = DocumentEditor::new(doc);
        let all = ed.overall_range();

        let first = ed.list_entry(all, 0).unwrap();
        assert_eq!(first.number_format(), Some(NumberFormat::Decimal));
        assert_eq!(first.start_at(), Some(1));
        assert_eq!(first.text(&ed).unwrap(), "first\r");
        assert_eq!(ed.kind(first.range_id()).unwrap(), RangeKind::ListEntry);

        let second = ed.list_entry(all, 1).unwrap();
        assert_eq!(second.ilvl(), 1);
        assert_eq!(second.start_at(), Some(5));

        assert!(ed.list_entry(all, 2).unwrap().level().is_none());
        // unknown override degrades to no level
        assert!(ed.list_entry(all, 3).unwrap().level().is_none());
    }

    #[test]
    fn test_set_ilvl_re_resolves() {
        let mut lists = ListTables::new();
        let ilfo = lists.add_list(ListData::numbered(1));
        let doc = DocumentBuilder::new()
            .lists(lists)
            .list_paragraph(ilfo, 0, "item")
            .build()
            .unwrap();
        let mut ed = DocumentEditor::new(doc);
        let all = ed.overall_range();
        let mut entry = ed.list_entry(all, 0).unwrap();
        entry.set_ilvl(&mut ed, 2).unwrap();
        assert_eq!(entry.level().unwrap().number_text.chars().count(), 6);
        assert_eq!(ed.list_entry(all, 0).unwrap().ilvl(), 2);
    }
}

//! Document editor - owns the document and every range view over it

use crate::range::{RangeArena, View, Window};
use crate::{EditError, RangeId, RangeKind, Result};
use doc_model::{strip_fields, Document, PropertyKind, Story};

/// Owns a [`Document`] and the range views handed out over it.
///
/// Reads go through `&self`; anything that creates a view or changes the
/// document needs `&mut self`.
#[derive(Debug)]
pub struct DocumentEditor {
    pub(crate) doc: Document,
    pub(crate) ranges: RangeArena,
}

impl DocumentEditor {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            ranges: RangeArena::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Direct access to the document. Structural table changes made here
    /// leave existing range windows stale.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Number of live range views
    pub fn live_ranges(&self) -> usize {
        self.ranges.len()
    }

    // =========================================================================
    // Creating ranges
    // =========================================================================

    /// The whole document
    pub fn overall_range(&mut self) -> RangeId {
        let end = self.doc.length();
        self.ranges
            .insert(View::new(0, end, None, RangeKind::Overall))
    }

    /// One story
    pub fn story_range(&mut self, story: Story) -> RangeId {
        let span = self.doc.stories().range(story);
        self.ranges
            .insert(View::new(span.start, span.end, None, RangeKind::Story(story)))
    }

    /// A parentless range over `[start, end)`
    pub fn range(&mut self, start: usize, end: usize) -> Result<RangeId> {
        let len = self.doc.length();
        if start > end || end > len {
            return Err(EditError::InvalidRange { start, end });
        }
        Ok(self.ranges.insert(View::new(start, end, None, RangeKind::Span)))
    }

    /// A range nested in `parent`; it must lie within the parent's span
    pub fn sub_range(&mut self, parent: RangeId, start: usize, end: usize) -> Result<RangeId> {
        self.child(parent, start, end, RangeKind::Span)
    }

    /// A child view of `kind`. Typed kinds reuse the view already standing
    /// for the same span of `parent`; plain spans are always new.
    pub(crate) fn child(
        &mut self,
        parent: RangeId,
        start: usize,
        end: usize,
        kind: RangeKind,
    ) -> Result<RangeId> {
        if start > end {
            return Err(EditError::InvalidRange { start, end });
        }
        let p = self.ranges.get(parent)?;
        if start < p.start || end > p.end {
            return Err(EditError::OutsideParent {
                start,
                end,
                parent_start: p.start,
                parent_end: p.end,
            });
        }
        let view = View::new(start, end, Some(parent), kind);
        match kind {
            RangeKind::Span => Ok(self.ranges.insert(view)),
            _ => Ok(self.ranges.insert_shared(view)),
        }
    }

    /// Drop a view. Children keep working but no longer reach it as an ancestor.
    /// Typed views of the same node of the same parent share one view, so
    /// releasing one releases them all.
    pub fn release(&mut self, id: RangeId) -> Result<()> {
        self.ranges.remove(id)?;
        Ok(())
    }

    // =========================================================================
    // Span and windows
    // =========================================================================

    pub fn start(&self, id: RangeId) -> Result<usize> {
        Ok(self.ranges.get(id)?.start)
    }

    pub fn end(&self, id: RangeId) -> Result<usize> {
        Ok(self.ranges.get(id)?.end)
    }

    pub fn span(&self, id: RangeId) -> Result<(usize, usize)> {
        let view = self.ranges.get(id)?;
        Ok((view.start, view.end))
    }

    pub fn len(&self, id: RangeId) -> Result<usize> {
        let (start, end) = self.span(id)?;
        Ok(end - start)
    }

    pub fn parent(&self, id: RangeId) -> Result<Option<RangeId>> {
        Ok(self.ranges.get(id)?.parent)
    }

    pub fn kind(&self, id: RangeId) -> Result<RangeKind> {
        Ok(self.ranges.get(id)?.kind)
    }

    /// Whether any cached window was resolved against an older table
    pub fn is_stale(&self, id: RangeId) -> Result<bool> {
        let view = self.ranges.get(id)?;
        Ok(PropertyKind::EDIT_ORDER.iter().any(|&kind| {
            let window = view.window(kind);
            window.resolved && window.generation != self.doc.generation(kind)
        }))
    }

    /// Forget every cached window; the next access resolves from scratch
    pub fn reset(&self, id: RangeId) -> Result<()> {
        self.ranges.get(id)?.clear_windows();
        Ok(())
    }

    /// Index window `[x, y)` of `kind` nodes overlapping the range
    pub(crate) fn window(&self, id: RangeId, kind: PropertyKind) -> Result<(usize, usize)> {
        let view = self.ranges.get(id)?;
        let generation = self.doc.generation(kind);
        let cached = view.window(kind);
        if cached.is_fresh(generation) {
            return Ok((cached.start, cached.end));
        }

        let hint = if cached.resolved {
            tracing::trace!("{:?} window of {:?} is stale, resolving from 0", kind, id);
            0
        } else {
            self.parent_hint(view, kind)
        };
        let (start, end) = self.doc.find_range(kind, hint, view.start, view.end);
        view.set_window(
            kind,
            Window {
                start,
                end,
                generation,
                resolved: true,
            },
        );
        Ok((start, end))
    }

    /// First index of the parent's fresh window, a safe place to start scanning
    fn parent_hint(&self, view: &View, kind: PropertyKind) -> usize {
        view.parent
            .and_then(|p| self.ranges.get(p).ok())
            .map(|p| p.window(kind))
            .filter(|w| w.is_fresh(self.doc.generation(kind)))
            .map(|w| w.start)
            .unwrap_or(0)
    }

    /// Table index of the `index`-th `kind` node of the range
    pub(crate) fn node_index(
        &self,
        id: RangeId,
        kind: PropertyKind,
        index: usize,
    ) -> Result<usize> {
        let (x, y) = self.window(id, kind)?;
        if index >= y - x {
            return Err(EditError::IndexOutOfBounds {
                kind,
                index,
                len: y - x,
            });
        }
        Ok(x + index)
    }

    /// Span of table node `index` clipped to the range
    pub(crate) fn clipped_span(
        &self,
        id: RangeId,
        kind: PropertyKind,
        index: usize,
    ) -> Result<(usize, usize)> {
        let (start, end) = self.span(id)?;
        let (node_start, node_end) = self.doc.node_span(kind, index)?;
        Ok((start.max(node_start), end.min(node_end)))
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Number of `kind` nodes the range overlaps
    pub fn count(&self, id: RangeId, kind: PropertyKind) -> Result<usize> {
        let (x, y) = self.window(id, kind)?;
        Ok(y - x)
    }

    pub fn num_sections(&self, id: RangeId) -> Result<usize> {
        self.count(id, PropertyKind::Section)
    }

    pub fn num_paragraphs(&self, id: RangeId) -> Result<usize> {
        self.count(id, PropertyKind::Paragraph)
    }

    pub fn num_character_runs(&self, id: RangeId) -> Result<usize> {
        self.count(id, PropertyKind::CharacterRun)
    }

    /// Text covered by the range
    pub fn text(&self, id: RangeId) -> Result<String> {
        let (x, y) = self.window(id, PropertyKind::Text)?;
        let (start, end) = self.span(id)?;
        Ok(self.doc.text().text_in_window(x, y, start, end))
    }

    /// Text with field codes removed and field results kept
    pub fn text_without_fields(&self, id: RangeId) -> Result<String> {
        Ok(strip_fields(&self.text(id)?))
    }

    /// Check the document's coverage invariants and that every cached window
    /// of this range matches its span
    pub fn sanity_check(&self, id: RangeId) -> Result<()> {
        self.doc.sanity_check()?;
        let (start, end) = self.span(id)?;
        if end > self.doc.length() {
            return Err(EditError::InconsistentRange(format!(
                "range ends at {} past the document end {}",
                end,
                self.doc.length()
            )));
        }
        for kind in PropertyKind::EDIT_ORDER {
            let (x, y) = self.window(id, kind)?;
            for index in x..y {
                let (node_start, node_end) = self.doc.node_span(kind, index)?;
                let touches = node_start < end && node_end > start;
                if !touches && start != end {
                    return Err(EditError::InconsistentRange(format!(
                        "{:?} node {} [{}, {}) is outside [{}, {})",
                        kind, index, node_start, node_end, start, end
                    )));
                }
            }
            let outside = [x.checked_sub(1), Some(y)];
            for index in outside.into_iter().flatten() {
                let Ok((node_start, node_end)) = self.doc.node_span(kind, index) else {
                    continue;
                };
                if node_start < end && node_end > start {
                    return Err(EditError::InconsistentRange(format!(
                        "{:?} node {} [{}, {}) overlaps [{}, {}) but is outside the window",
                        kind, index, node_start, node_end, start, end
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::DocumentBuilder;

    fn editor() -> DocumentEditor {
        let doc = DocumentBuilder::new()
            .paragraph("Hello")
            .paragraph("big")
            .paragraph("World")
            .build()
            .unwrap();
        DocumentEditor::new(doc)
    }

    #[test]
    fn test_overall_range_reads_everything() {
        let mut ed = editor();
        let all = ed.overall_range();
        assert_eq!(ed.span(all).unwrap(), (0, 16));
        assert_eq!(ed.text(all).unwrap(), "Hello\rbig\rWorld\r");
        assert_eq!(ed.num_paragraphs(all).unwrap(), 3);
        assert_eq!(ed.num_sections(all).unwrap(), 1);
        ed.sanity_check(all).unwrap();
    }

    #[test]
    fn test_sub_range_windows() {
        let mut ed = editor();
        let all = ed.overall_range();
        let mid = ed.sub_range(all, 3, 8).unwrap();
        assert_eq!(ed.text(mid).unwrap(), "lo\rbi");
        assert_eq!(ed.num_paragraphs(mid).unwrap(), 2);
        assert_eq!(ed.parent(mid).unwrap(), Some(all));

        let empty = ed.sub_range(all, 6, 6).unwrap();
        assert_eq!(ed.num_paragraphs(empty).unwrap(), 0);
        assert_eq!(ed.text(empty).unwrap(), "");
        ed.sanity_check(mid).unwrap();
    }

    #[test]
    fn test_range_validation() {
        let mut ed = editor();
        assert!(matches!(ed.range(5, 2), Err(EditError::InvalidRange { .. })));
        assert!(matches!(ed.range(0, 17), Err(EditError::InvalidRange { .. })));
        let r = ed.range(2, 6).unwrap();
        assert!(matches!(
            ed.sub_range(r, 1, 4),
            Err(EditError::OutsideParent { parent_start: 2, .. })
        ));
    }

    #[test]
    fn test_staleness_and_reset() {
        let mut ed = editor();
        let all = ed.overall_range();
        assert_eq!(ed.num_paragraphs(all).unwrap(), 3);
        assert!(!ed.is_stale(all).unwrap());

        // a structural change made behind the editor's back
        let len = ed.document().length();
        ed.document_mut()
            .paragraphs_mut()
            .adjust_for_insert(0, 0)
            .unwrap();
        assert_eq!(ed.document().length(), len);
        assert!(ed.is_stale(all).unwrap());

        // re-resolved on access
        assert_eq!(ed.num_paragraphs(all).unwrap(), 3);
        assert!(!ed.is_stale(all).unwrap());

        ed.reset(all).unwrap();
        assert!(!ed.is_stale(all).unwrap());
    }

    #[test]
    fn test_release_invalidates_handle() {
        let mut ed = editor();
        let r = ed.range(0, 1).unwrap();
        assert_eq!(ed.live_ranges(), 1);
        ed.release(r).unwrap();
        assert_eq!(ed.live_ranges(), 0);
        assert!(matches!(ed.text(r), Err(EditError::UnknownRange(_))));
    }

    #[test]
    fn test_story_range_and_fields() {
        let doc = DocumentBuilder::new()
            .paragraph("See \u{13}REF x\u{14}here\u{15}")
            .story(Story::Footnote)
            .paragraph("fn")
            .build()
            .unwrap();
        let mut ed = DocumentEditor::new(doc);
        let main = ed.story_range(Story::Main);
        assert_eq!(ed.text_without_fields(main).unwrap(), "See here\r");
        let note = ed.story_range(Story::Footnote);
        assert_eq!(ed.text(note).unwrap(), "fn\r");
        assert_eq!(ed.kind(note).unwrap(), RangeKind::Story(Story::Footnote));
    }
}

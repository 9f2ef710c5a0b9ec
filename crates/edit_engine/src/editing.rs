//! Structural edits: insert and delete with offset repair
//!
//! An insertion grows one node in every property table and shifts the nodes
//! after it; the edited range and each of its ancestors grow with it, and the
//! story holding the insertion point absorbs the new length. A deletion clips
//! every table, collapses the range and clips its ancestors.
//!
//! Edits are not transactional: an error part way through leaves the tables
//! that were already adjusted as they are.

use crate::{CharacterRun, DocumentEditor, EditError, Paragraph, RangeId, Result};
use doc_model::{
    CharacterProperties, Chpx, NodePayload, Papx, ParagraphProperties, PropertyTable, Story,
    PARAGRAPH_MARK,
};

/// Which end of a range an insertion goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Before,
    After,
}

/// Node an insertion attaches to, and the position it happens at.
///
/// A non-empty range inserts into its own first (before) or last (after)
/// node. An empty range sits on a boundary and attaches to the node below it.
fn anchor<T: NodePayload>(
    table: &PropertyTable<T>,
    start: usize,
    end: usize,
    side: Side,
) -> doc_model::Result<(usize, usize)> {
    if start == end {
        return Ok((table.index_before(start)?, start));
    }
    match side {
        Side::Before => Ok((table.index_at_or_after(start)?, start)),
        Side::After => Ok((table.index_before(end)?, end)),
    }
}

impl DocumentEditor {
    /// Story whose counter absorbs an insertion at `cp`. Follows [`anchor`]:
    /// inserting before a non-empty range lands in the story holding its first
    /// character; otherwise the text joins the node below `cp`.
    fn owning_story(&self, start: usize, end: usize, side: Side, cp: usize) -> Option<Story> {
        let stories = self.doc.stories();
        match side {
            Side::Before if start != end => stories
                .story_containing(cp)
                .or_else(|| stories.story_at(cp)),
            _ => stories.story_at(cp),
        }
    }

    // =========================================================================
    // Text insertion
    // =========================================================================

    /// Insert `text` at the start of the range. Returns the range's first run.
    pub fn insert_before(&mut self, id: RangeId, text: &str) -> Result<CharacterRun> {
        self.insert(id, Side::Before, text, None, None)?;
        self.character_run(id, 0)
    }

    /// Insert `text` at the end of the range. Returns the range's last run.
    pub fn insert_after(&mut self, id: RangeId, text: &str) -> Result<CharacterRun> {
        self.insert(id, Side::After, text, None, None)?;
        self.last_character_run(id)
    }

    /// Insert `text` at the start of the range as a new run with `props`
    pub fn insert_before_with_properties(
        &mut self,
        id: RangeId,
        text: &str,
        props: &CharacterProperties,
    ) -> Result<CharacterRun> {
        let cp = self.start(id)?;
        let chpx = self.compress_run(cp, props)?;
        self.insert(id, Side::Before, text, Some(chpx), None)?;
        self.character_run(id, 0)
    }

    /// Insert `text` at the end of the range as a new run with `props`
    pub fn insert_after_with_properties(
        &mut self,
        id: RangeId,
        text: &str,
        props: &CharacterProperties,
    ) -> Result<CharacterRun> {
        let cp = self.end(id)?;
        let chpx = self.compress_run(cp.saturating_sub(1), props)?;
        self.insert(id, Side::After, text, Some(chpx), None)?;
        self.last_character_run(id)
    }

    // =========================================================================
    // Paragraph insertion
    // =========================================================================

    /// Insert an empty paragraph with `props` and style `istd` at the start
    /// of the range
    pub fn insert_paragraph_before(
        &mut self,
        id: RangeId,
        props: &ParagraphProperties,
        istd: u16,
    ) -> Result<Paragraph> {
        self.insert_paragraph(id, Side::Before, props, istd, PARAGRAPH_MARK, None)
    }

    /// Insert an empty paragraph with `props` and style `istd` at the end of
    /// the range
    pub fn insert_paragraph_after(
        &mut self,
        id: RangeId,
        props: &ParagraphProperties,
        istd: u16,
    ) -> Result<Paragraph> {
        self.insert_paragraph(id, Side::After, props, istd, PARAGRAPH_MARK, None)
    }

    /// Insert a paragraph consisting of `mark` alone. `extra` is appended to
    /// the paragraph's sprms (table properties of a row end).
    pub(crate) fn insert_paragraph(
        &mut self,
        id: RangeId,
        side: Side,
        props: &ParagraphProperties,
        istd: u16,
        mark: char,
        extra: Option<&[u8]>,
    ) -> Result<Paragraph> {
        let styles = self.doc.styles();
        let mut papx = Papx::compress(props, istd, styles)?;
        if let Some(grpprl) = extra {
            papx.sprms.append_grpprl(grpprl);
        }
        let base_chp = styles.character_style(istd);
        let chpx = Chpx::compress(&base_chp, istd, styles)?;

        self.insert(id, side, &mark.to_string(), Some(chpx), Some(papx))?;
        match side {
            Side::Before => self.paragraph(id, 0),
            Side::After => {
                let last = self.num_paragraphs(id)?.saturating_sub(1);
                self.paragraph(id, last)
            }
        }
    }

    // =========================================================================
    // Core insert
    // =========================================================================

    /// Insert `text` at one end of the range. New run / paragraph payloads
    /// are spliced in as their own nodes before the tables are adjusted.
    /// Returns the position the text went in at.
    pub(crate) fn insert(
        &mut self,
        id: RangeId,
        side: Side,
        text: &str,
        chpx: Option<Chpx>,
        papx: Option<Papx>,
    ) -> Result<usize> {
        let (start, end) = self.span(id)?;
        let length = text.chars().count();
        let cp = match side {
            Side::Before => start,
            Side::After => end,
        };
        if length == 0 {
            return Ok(cp);
        }

        let (index, cp) = anchor(self.doc.text(), start, end, side)?;
        self.doc.text_mut().insert_text(index, cp, text)?;

        let (index, _) = anchor(self.doc.runs(), start, end, side)?;
        let index = match chpx {
            Some(chpx) => self.doc.runs_mut().insert_node(index, cp, chpx)?,
            None => index,
        };
        self.doc.runs_mut().adjust_for_insert(index, length)?;

        let (index, _) = anchor(self.doc.paragraphs(), start, end, side)?;
        let index = match papx {
            Some(papx) => self.doc.paragraphs_mut().insert_node(index, cp, papx)?,
            None => index,
        };
        self.doc.paragraphs_mut().adjust_for_insert(index, length)?;

        let (index, _) = anchor(self.doc.sections(), start, end, side)?;
        self.doc.sections_mut().adjust_for_insert(index, length)?;

        self.ranges.get_mut(id)?.end += length;
        for ancestor in self.ranges.ancestors(id) {
            self.ranges.get_mut(ancestor)?.end += length;
        }
        match self.owning_story(start, end, side, cp) {
            Some(story) => self.doc.stories_mut().resize(story, length as isize),
            None => tracing::warn!("insertion at {} lies beyond every story", cp),
        }

        if self.doc.settings().sanity_check_edits {
            self.doc.sanity_check()?;
        }
        tracing::debug!("inserted {} characters at {} ({:?})", length, cp, side);
        Ok(cp)
    }

    // =========================================================================
    // Delete / replace
    // =========================================================================

    /// Delete the range's text from every table. The range collapses to an
    /// empty range at its start; ancestors shrink by the deleted span.
    pub fn delete(&mut self, id: RangeId) -> Result<()> {
        let (start, end) = self.span(id)?;
        if start == end {
            return Ok(());
        }
        let length = end - start;

        self.doc.text_mut().adjust_for_delete(start, length)?;
        self.doc.runs_mut().adjust_for_delete(start, length)?;
        self.doc.paragraphs_mut().adjust_for_delete(start, length)?;
        self.doc.sections_mut().adjust_for_delete(start, length)?;

        let clip = |cp: usize| {
            if cp <= start {
                cp
            } else if cp >= end {
                cp - length
            } else {
                start
            }
        };
        {
            let view = self.ranges.get_mut(id)?;
            view.end = start;
        }
        for ancestor in self.ranges.ancestors(id) {
            let view = self.ranges.get_mut(ancestor)?;
            view.start = clip(view.start);
            view.end = clip(view.end);
        }
        self.doc.stories_mut().remove(start, length);

        if self.doc.settings().sanity_check_edits {
            self.doc.sanity_check()?;
        }
        tracing::debug!("deleted [{}, {})", start, end);
        Ok(())
    }

    /// Replace the range's text with `new_text`. With `add_after` the new
    /// text goes in after the old and takes the properties at the range's
    /// end; otherwise it goes in before and takes those at its start.
    pub fn replace_text(&mut self, id: RangeId, new_text: &str, add_after: bool) -> Result<()> {
        let (start, end) = self.span(id)?;
        let old = if add_after {
            self.insert(id, Side::After, new_text, None, None)?;
            self.sub_range(id, start, end)?
        } else {
            let length = new_text.chars().count();
            self.insert(id, Side::Before, new_text, None, None)?;
            self.sub_range(id, start + length, end + length)?
        };
        let deleted = self.delete(old);
        self.release(old)?;
        deleted
    }

    /// Replace every occurrence of `placeholder` in the range with `value`.
    /// Returns the number of replacements.
    pub fn replace_placeholder(
        &mut self,
        id: RangeId,
        placeholder: &str,
        value: &str,
    ) -> Result<usize> {
        if placeholder.is_empty() {
            return Err(EditError::InvalidRange { start: 0, end: 0 });
        }
        let placeholder_len = placeholder.chars().count();
        let value_len = value.chars().count();
        let mut replaced = 0;
        let mut from = 0;

        loop {
            let text = self.text(id)?;
            let chars: Vec<char> = text.chars().collect();
            let needle: Vec<char> = placeholder.chars().collect();
            let Some(offset) = chars
                .get(from..)
                .and_then(|rest| rest.windows(needle.len()).position(|w| w == needle.as_slice()))
                .map(|p| p + from)
            else {
                break;
            };

            let start = self.start(id)? + offset;
            let hit = self.sub_range(id, start, start + placeholder_len)?;
            let result = self.replace_text(hit, value, false);
            self.release(hit)?;
            result?;

            replaced += 1;
            from = offset + value_len;
        }

        if replaced > 0 {
            tracing::debug!("replaced {} occurrences of {:?}", replaced, placeholder);
        }
        Ok(replaced)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Compress run properties against the style of the paragraph at `cp`
    fn compress_run(&self, cp: usize, props: &CharacterProperties) -> Result<Chpx> {
        let istd = self.doc.paragraph_style_at(cp);
        Ok(Chpx::compress(props, istd, self.doc.styles())?)
    }

    fn last_character_run(&mut self, id: RangeId) -> Result<CharacterRun> {
        let last = self.num_character_runs(id)?.saturating_sub(1);
        self.character_run(id, last)
    }
}

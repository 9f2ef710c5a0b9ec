//! Paragraph - one paragraph node viewed through a range

use crate::{DocumentEditor, RangeId, RangeKind, Result, TextRange};
use doc_model::sprm;
use doc_model::{
    compress_table, BorderCode, Justification, LineSpacing, ParagraphProperties, PropertyKind,
    SprmBuffer, TableProperties,
};

/// A paragraph clipped to the range it was taken from, with its decoded
/// properties. Setters write both the decoded record and the node's sprms.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    id: RangeId,
    props: ParagraphProperties,
}

impl DocumentEditor {
    /// The `index`-th paragraph overlapping the range
    pub fn paragraph(&mut self, id: RangeId, index: usize) -> Result<Paragraph> {
        self.paragraph_as(id, index, RangeKind::Paragraph)
    }

    /// The `index`-th paragraph, held by a view of `kind`
    pub(crate) fn paragraph_as(
        &mut self,
        id: RangeId,
        index: usize,
        kind: RangeKind,
    ) -> Result<Paragraph> {
        let node = self.node_index(id, PropertyKind::Paragraph, index)?;
        let (start, end) = self.clipped_span(id, PropertyKind::Paragraph, node)?;
        let props = self.doc.paragraph_properties(node)?;
        let view = self.child(id, start, end, kind)?;
        Ok(Paragraph { id: view, props })
    }

    /// Every paragraph overlapping the range
    pub fn paragraphs(&mut self, id: RangeId) -> Result<Vec<Paragraph>> {
        let count = self.num_paragraphs(id)?;
        (0..count).map(|i| self.paragraph(id, i)).collect()
    }

    /// Table index of the paragraph node behind a paragraph view
    pub(crate) fn paragraph_node(&self, id: RangeId) -> Result<usize> {
        self.node_index(id, PropertyKind::Paragraph, 0)
    }

    fn update_paragraph(&mut self, id: RangeId, opcode: u16, operand: &[u8]) -> Result<()> {
        let node = self.paragraph_node(id)?;
        self.doc
            .paragraphs_mut()
            .payload_mut(node)?
            .sprms
            .update(opcode, operand);
        Ok(())
    }
}

fn flag(value: bool) -> [u8; 1] {
    [value as u8]
}

impl Paragraph {
    pub fn range_id(&self) -> RangeId {
        self.id
    }

    pub fn properties(&self) -> &ParagraphProperties {
        &self.props
    }

    pub fn style_index(&self) -> u16 {
        self.props.istd
    }

    pub fn justification(&self) -> Justification {
        self.props.justification
    }

    pub fn keep_on_page(&self) -> bool {
        self.props.keep_on_page
    }

    pub fn keep_with_next(&self) -> bool {
        self.props.keep_with_next
    }

    pub fn page_break_before(&self) -> bool {
        self.props.page_break_before
    }

    pub fn widow_control(&self) -> bool {
        self.props.widow_control
    }

    pub fn indent_left(&self) -> i16 {
        self.props.indent_left
    }

    pub fn indent_right(&self) -> i16 {
        self.props.indent_right
    }

    pub fn first_line_indent(&self) -> i16 {
        self.props.first_line_indent
    }

    pub fn spacing_before(&self) -> u16 {
        self.props.spacing_before
    }

    pub fn spacing_after(&self) -> u16 {
        self.props.spacing_after
    }

    pub fn line_spacing(&self) -> LineSpacing {
        self.props.line_spacing
    }

    pub fn is_in_table(&self) -> bool {
        self.props.in_table
    }

    pub fn is_table_row_end(&self) -> bool {
        self.props.is_table_row_end()
    }

    /// Cell-closing paragraph of a nested table
    pub fn is_embedded_cell_mark(&self) -> bool {
        self.props.inner_table_cell
    }

    pub fn table_level(&self) -> i32 {
        self.props.table_level()
    }

    pub fn is_in_list(&self) -> bool {
        self.props.is_in_list()
    }

    pub fn ilfo(&self) -> u16 {
        self.props.ilfo
    }

    pub fn ilvl(&self) -> u8 {
        self.props.ilvl
    }

    pub fn outline_level(&self) -> u8 {
        self.props.outline_level
    }

    pub fn border_top(&self) -> BorderCode {
        self.props.border_top
    }

    pub fn border_left(&self) -> BorderCode {
        self.props.border_left
    }

    pub fn border_bottom(&self) -> BorderCode {
        self.props.border_bottom
    }

    pub fn border_right(&self) -> BorderCode {
        self.props.border_right
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Point the paragraph at another style. Its sprms now apply on top of
    /// that style, so the decoded record is rebuilt from both.
    pub fn set_style_index(&mut self, editor: &mut DocumentEditor, istd: u16) -> Result<()> {
        let node = editor.paragraph_node(self.id)?;
        editor.doc.paragraphs_mut().payload_mut(node)?.istd = istd;
        self.props = editor.doc.paragraph_properties(node)?;
        Ok(())
    }

    pub fn set_justification(
        &mut self,
        editor: &mut DocumentEditor,
        value: Justification,
    ) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_JC, &[value.code()])?;
        self.props.justification = value;
        Ok(())
    }

    pub fn set_keep_on_page(&mut self, editor: &mut DocumentEditor, value: bool) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_F_KEEP, &flag(value))?;
        self.props.keep_on_page = value;
        Ok(())
    }

    pub fn set_keep_with_next(&mut self, editor: &mut DocumentEditor, value: bool) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_F_KEEP_FOLLOW, &flag(value))?;
        self.props.keep_with_next = value;
        Ok(())
    }

    pub fn set_page_break_before(
        &mut self,
        editor: &mut DocumentEditor,
        value: bool,
    ) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_F_PAGE_BREAK_BEFORE, &flag(value))?;
        self.props.page_break_before = value;
        Ok(())
    }

    pub fn set_widow_control(&mut self, editor: &mut DocumentEditor, value: bool) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_F_WIDOW_CONTROL, &flag(value))?;
        self.props.widow_control = value;
        Ok(())
    }

    pub fn set_indent_left(&mut self, editor: &mut DocumentEditor, twips: i16) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_DXA_LEFT, &twips.to_le_bytes())?;
        self.props.indent_left = twips;
        Ok(())
    }

    pub fn set_indent_right(&mut self, editor: &mut DocumentEditor, twips: i16) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_DXA_RIGHT, &twips.to_le_bytes())?;
        self.props.indent_right = twips;
        Ok(())
    }

    pub fn set_first_line_indent(&mut self, editor: &mut DocumentEditor, twips: i16) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_DXA_LEFT1, &twips.to_le_bytes())?;
        self.props.first_line_indent = twips;
        Ok(())
    }

    pub fn set_spacing_before(&mut self, editor: &mut DocumentEditor, twips: u16) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_DYA_BEFORE, &twips.to_le_bytes())?;
        self.props.spacing_before = twips;
        Ok(())
    }

    pub fn set_spacing_after(&mut self, editor: &mut DocumentEditor, twips: u16) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_DYA_AFTER, &twips.to_le_bytes())?;
        self.props.spacing_after = twips;
        Ok(())
    }

    pub fn set_line_spacing(
        &mut self,
        editor: &mut DocumentEditor,
        value: LineSpacing,
    ) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_DYA_LINE, &value.to_u32().to_le_bytes())?;
        self.props.line_spacing = value;
        Ok(())
    }

    pub fn set_in_table(&mut self, editor: &mut DocumentEditor, value: bool) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_F_IN_TABLE, &flag(value))?;
        self.props.in_table = value;
        Ok(())
    }

    pub fn set_table_level(&mut self, editor: &mut DocumentEditor, level: i32) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_ITAP, &level.to_le_bytes())?;
        self.props.table_depth = level;
        Ok(())
    }

    pub fn set_embedded_cell_mark(
        &mut self,
        editor: &mut DocumentEditor,
        value: bool,
    ) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_F_INNER_TABLE_CELL, &flag(value))?;
        self.props.inner_table_cell = value;
        Ok(())
    }

    /// Make this paragraph close a table row carrying `table`
    pub fn set_table_row_end(
        &mut self,
        editor: &mut DocumentEditor,
        table: &TableProperties,
    ) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_F_IN_TABLE, &[1])?;
        editor.update_paragraph(self.id, sprm::SPRM_P_F_TTP, &[1])?;
        let node = editor.paragraph_node(self.id)?;
        let table_sprms = SprmBuffer::from_bytes(compress_table(table))?;
        let sprms = &mut editor.doc.paragraphs_mut().payload_mut(node)?.sprms;
        for op in table_sprms.iter() {
            let op = op?;
            sprms.update(op.opcode, op.operand);
        }
        self.props.in_table = true;
        self.props.table_row_end = true;
        Ok(())
    }

    pub fn set_ilfo(&mut self, editor: &mut DocumentEditor, ilfo: u16) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_ILFO, &ilfo.to_le_bytes())?;
        self.props.ilfo = ilfo;
        Ok(())
    }

    pub fn set_ilvl(&mut self, editor: &mut DocumentEditor, ilvl: u8) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_ILVL, &[ilvl])?;
        self.props.ilvl = ilvl;
        Ok(())
    }

    pub fn set_outline_level(&mut self, editor: &mut DocumentEditor, level: u8) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_OUT_LVL, &[level])?;
        self.props.outline_level = level;
        Ok(())
    }

    pub fn set_border_top(&mut self, editor: &mut DocumentEditor, brc: BorderCode) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_BRC_TOP, &brc.to_u32().to_le_bytes())?;
        self.props.border_top = brc;
        Ok(())
    }

    pub fn set_border_left(&mut self, editor: &mut DocumentEditor, brc: BorderCode) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_BRC_LEFT, &brc.to_u32().to_le_bytes())?;
        self.props.border_left = brc;
        Ok(())
    }

    pub fn set_border_bottom(
        &mut self,
        editor: &mut DocumentEditor,
        brc: BorderCode,
    ) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_BRC_BOTTOM, &brc.to_u32().to_le_bytes())?;
        self.props.border_bottom = brc;
        Ok(())
    }

    pub fn set_border_right(&mut self, editor: &mut DocumentEditor, brc: BorderCode) -> Result<()> {
        editor.update_paragraph(self.id, sprm::SPRM_P_BRC_RIGHT, &brc.to_u32().to_le_bytes())?;
        self.props.border_right = brc;
        Ok(())
    }
}

impl TextRange for Paragraph {
    fn range_id(&self) -> RangeId {
        Paragraph::range_id(self)
    }
}

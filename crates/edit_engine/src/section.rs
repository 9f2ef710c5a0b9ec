//! Section - one section node viewed through a range

use crate::{DocumentEditor, RangeId, RangeKind, Result, TextRange};
use doc_model::sprm;
use doc_model::{PropertyKind, SectionBreak, SectionProperties};

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    id: RangeId,
    props: SectionProperties,
}

impl DocumentEditor {
    /// The `index`-th section overlapping the range
    pub fn section(&mut self, id: RangeId, index: usize) -> Result<Section> {
        let node = self.node_index(id, PropertyKind::Section, index)?;
        let (start, end) = self.clipped_span(id, PropertyKind::Section, node)?;
        let props = self.doc.section_properties(node)?;
        let view = self.child(id, start, end, RangeKind::Section)?;
        Ok(Section { id: view, props })
    }

    fn update_section(&mut self, id: RangeId, opcode: u16, operand: &[u8]) -> Result<()> {
        let node = self.node_index(id, PropertyKind::Section, 0)?;
        self.doc
            .sections_mut()
            .payload_mut(node)?
            .sprms
            .update(opcode, operand);
        Ok(())
    }
}

impl Section {
    pub fn range_id(&self) -> RangeId {
        self.id
    }

    pub fn properties(&self) -> &SectionProperties {
        &self.props
    }

    pub fn break_kind(&self) -> SectionBreak {
        self.props.break_kind
    }

    pub fn set_break_kind(
        &mut self,
        editor: &mut DocumentEditor,
        value: SectionBreak,
    ) -> Result<()> {
        editor.update_section(self.id, sprm::SPRM_S_BKC, &[value.code()])?;
        self.props.break_kind = value;
        Ok(())
    }

    pub fn has_title_page(&self) -> bool {
        self.props.title_page
    }

    pub fn set_title_page(&mut self, editor: &mut DocumentEditor, value: bool) -> Result<()> {
        editor.update_section(self.id, sprm::SPRM_S_F_TITLE_PAGE, &[value as u8])?;
        self.props.title_page = value;
        Ok(())
    }

    pub fn num_columns(&self) -> u16 {
        self.props.columns
    }

    pub fn set_num_columns(&mut self, editor: &mut DocumentEditor, columns: u16) -> Result<()> {
        let columns = columns.max(1);
        editor.update_section(self.id, sprm::SPRM_S_CCOLUMNS, &(columns - 1).to_le_bytes())?;
        self.props.columns = columns;
        Ok(())
    }

    /// Gap between columns, in twips
    pub fn column_spacing(&self) -> u16 {
        self.props.column_spacing
    }

    pub fn set_column_spacing(&mut self, editor: &mut DocumentEditor, twips: u16) -> Result<()> {
        editor.update_section(self.id, sprm::SPRM_S_DXA_COLUMNS, &twips.to_le_bytes())?;
        self.props.column_spacing = twips;
        Ok(())
    }

    pub fn has_line_between_columns(&self) -> bool {
        self.props.line_between
    }

    pub fn set_line_between_columns(
        &mut self,
        editor: &mut DocumentEditor,
        value: bool,
    ) -> Result<()> {
        editor.update_section(self.id, sprm::SPRM_S_L_BETWEEN, &[value as u8])?;
        self.props.line_between = value;
        Ok(())
    }

    pub fn page_number_format(&self) -> u8 {
        self.props.page_number_format
    }

    pub fn set_page_number_format(&mut self, editor: &mut DocumentEditor, nfc: u8) -> Result<()> {
        editor.update_section(self.id, sprm::SPRM_S_NFC_PGN, &[nfc])?;
        self.props.page_number_format = nfc;
        Ok(())
    }

    pub fn is_landscape(&self) -> bool {
        self.props.landscape
    }

    pub fn set_landscape(&mut self, editor: &mut DocumentEditor, value: bool) -> Result<()> {
        let orientation = if value { 2 } else { 1 };
        editor.update_section(self.id, sprm::SPRM_S_B_ORIENTATION, &[orientation])?;
        self.props.landscape = value;
        Ok(())
    }

    pub fn page_width(&self) -> u16 {
        self.props.page_width
    }

    pub fn page_height(&self) -> u16 {
        self.props.page_height
    }

    pub fn set_page_size(
        &mut self,
        editor: &mut DocumentEditor,
        width: u16,
        height: u16,
    ) -> Result<()> {
        editor.update_section(self.id, sprm::SPRM_S_XA_PAGE, &width.to_le_bytes())?;
        editor.update_section(self.id, sprm::SPRM_S_YA_PAGE, &height.to_le_bytes())?;
        self.props.page_width = width;
        self.props.page_height = height;
        Ok(())
    }

    pub fn margin_left(&self) -> u16 {
        self.props.margin_left
    }

    pub fn margin_right(&self) -> u16 {
        self.props.margin_right
    }

    pub fn margin_top(&self) -> i16 {
        self.props.margin_top
    }

    pub fn margin_bottom(&self) -> i16 {
        self.props.margin_bottom
    }

    pub fn set_margin_left(&mut self, editor: &mut DocumentEditor, twips: u16) -> Result<()> {
        editor.update_section(self.id, sprm::SPRM_S_DXA_LEFT, &twips.to_le_bytes())?;
        self.props.margin_left = twips;
        Ok(())
    }

    pub fn set_margin_right(&mut self, editor: &mut DocumentEditor, twips: u16) -> Result<()> {
        editor.update_section(self.id, sprm::SPRM_S_DXA_RIGHT, &twips.to_le_bytes())?;
        self.props.margin_right = twips;
        Ok(())
    }

    /// Negative values fix the margin regardless of header height
    pub fn set_margin_top(&mut self, editor: &mut DocumentEditor, twips: i16) -> Result<()> {
        editor.update_section(self.id, sprm::SPRM_S_DYA_TOP, &twips.to_le_bytes())?;
        self.props.margin_top = twips;
        Ok(())
    }

    pub fn set_margin_bottom(&mut self, editor: &mut DocumentEditor, twips: i16) -> Result<()> {
        editor.update_section(self.id, sprm::SPRM_S_DYA_BOTTOM, &twips.to_le_bytes())?;
        self.props.margin_bottom = twips;
        Ok(())
    }
}

impl TextRange for Section {
    fn range_id(&self) -> RangeId {
        Section::range_id(self)
    }
}

//! Paragraph properties (PAP) and their compressed form (PAPX)

use crate::sprm::{self, SprmBuffer, SprmOperation};
use crate::{BorderCode, NodePayload, Result, StyleSheet};
use serde::{Deserialize, Serialize};

/// Paragraph justification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Justification {
    #[default]
    Left,
    Center,
    Right,
    Both,
    Distribute,
}

impl Justification {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Justification::Center,
            2 => Justification::Right,
            3 => Justification::Both,
            4 => Justification::Distribute,
            _ => Justification::Left,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Justification::Left => 0,
            Justification::Center => 1,
            Justification::Right => 2,
            Justification::Both => 3,
            Justification::Distribute => 4,
        }
    }
}

/// Line spacing descriptor (LSPD)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpacing {
    /// Twips, or 240ths of a line when `multiple` is set
    pub line: i16,
    pub multiple: bool,
}

impl Default for LineSpacing {
    fn default() -> Self {
        Self {
            line: 240,
            multiple: true,
        }
    }
}

impl LineSpacing {
    pub fn from_u32(value: u32) -> Self {
        Self {
            line: (value & 0xFFFF) as u16 as i16,
            multiple: (value >> 16) & 0xFFFF != 0,
        }
    }

    pub fn to_u32(&self) -> u32 {
        (self.line as u16 as u32) | ((self.multiple as u32) << 16)
    }
}

/// Decoded paragraph properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphProperties {
    /// Style index
    pub istd: u16,
    pub justification: Justification,
    pub keep_on_page: bool,
    pub keep_with_next: bool,
    pub page_break_before: bool,
    pub widow_control: bool,
    /// Indents in twips
    pub indent_left: i16,
    pub indent_right: i16,
    pub first_line_indent: i16,
    /// Spacing in twips
    pub spacing_before: u16,
    pub spacing_after: u16,
    pub line_spacing: LineSpacing,
    pub in_table: bool,
    pub table_row_end: bool,
    pub inner_table_cell: bool,
    pub inner_table_row_end: bool,
    /// Table nesting depth (itap)
    pub table_depth: i32,
    /// 1-based list format override index, 0 for none
    pub ilfo: u16,
    pub ilvl: u8,
    pub outline_level: u8,
    pub border_top: BorderCode,
    pub border_left: BorderCode,
    pub border_bottom: BorderCode,
    pub border_right: BorderCode,
}

impl Default for ParagraphProperties {
    fn default() -> Self {
        Self {
            istd: 0,
            justification: Justification::Left,
            keep_on_page: false,
            keep_with_next: false,
            page_break_before: false,
            widow_control: true,
            indent_left: 0,
            indent_right: 0,
            first_line_indent: 0,
            spacing_before: 0,
            spacing_after: 0,
            line_spacing: LineSpacing::default(),
            in_table: false,
            table_row_end: false,
            inner_table_cell: false,
            inner_table_row_end: false,
            table_depth: 0,
            ilfo: 0,
            ilvl: 0,
            outline_level: 9,
            border_top: BorderCode::default(),
            border_left: BorderCode::default(),
            border_bottom: BorderCode::default(),
            border_right: BorderCode::default(),
        }
    }
}

impl ParagraphProperties {
    /// Properties of a cell paragraph in a top-level table
    pub fn table_cell() -> Self {
        Self {
            in_table: true,
            table_depth: 1,
            ..Default::default()
        }
    }

    /// Nesting level of the table this paragraph belongs to; 0 outside tables
    pub fn table_level(&self) -> i32 {
        if self.table_depth > 0 {
            self.table_depth
        } else if self.in_table {
            1
        } else {
            0
        }
    }

    /// Whether this paragraph closes a table row at its level
    pub fn is_table_row_end(&self) -> bool {
        self.table_row_end || self.inner_table_row_end
    }

    /// Whether this paragraph belongs to a list
    pub fn is_in_list(&self) -> bool {
        self.ilfo != 0
    }

    /// Apply one paragraph sprm. Sprms of other groups are ignored.
    pub fn apply_sprm(&mut self, op: &SprmOperation<'_>) {
        match op.opcode {
            sprm::SPRM_P_JC => self.justification = Justification::from_code(op.operand_u8()),
            sprm::SPRM_P_F_KEEP => self.keep_on_page = op.operand_u8() != 0,
            sprm::SPRM_P_F_KEEP_FOLLOW => self.keep_with_next = op.operand_u8() != 0,
            sprm::SPRM_P_F_PAGE_BREAK_BEFORE => self.page_break_before = op.operand_u8() != 0,
            sprm::SPRM_P_F_WIDOW_CONTROL => self.widow_control = op.operand_u8() != 0,
            sprm::SPRM_P_ILVL => self.ilvl = op.operand_u8(),
            sprm::SPRM_P_ILFO => self.ilfo = op.operand_u16(),
            sprm::SPRM_P_DXA_RIGHT => self.indent_right = op.operand_i16(),
            sprm::SPRM_P_DXA_LEFT => self.indent_left = op.operand_i16(),
            sprm::SPRM_P_DXA_LEFT1 => self.first_line_indent = op.operand_i16(),
            sprm::SPRM_P_DYA_LINE => self.line_spacing = LineSpacing::from_u32(op.operand_u32()),
            sprm::SPRM_P_DYA_BEFORE => self.spacing_before = op.operand_u16(),
            sprm::SPRM_P_DYA_AFTER => self.spacing_after = op.operand_u16(),
            sprm::SPRM_P_F_IN_TABLE => self.in_table = op.operand_u8() != 0,
            sprm::SPRM_P_F_TTP => self.table_row_end = op.operand_u8() != 0,
            sprm::SPRM_P_F_INNER_TABLE_CELL => self.inner_table_cell = op.operand_u8() != 0,
            sprm::SPRM_P_F_INNER_TTP => self.inner_table_row_end = op.operand_u8() != 0,
            sprm::SPRM_P_ITAP => self.table_depth = op.operand_i32(),
            sprm::SPRM_P_OUT_LVL => self.outline_level = op.operand_u8(),
            sprm::SPRM_P_BRC_TOP => self.border_top = BorderCode::from_u32(op.operand_u32()),
            sprm::SPRM_P_BRC_LEFT => self.border_left = BorderCode::from_u32(op.operand_u32()),
            sprm::SPRM_P_BRC_BOTTOM => {
                self.border_bottom = BorderCode::from_u32(op.operand_u32())
            }
            sprm::SPRM_P_BRC_RIGHT => self.border_right = BorderCode::from_u32(op.operand_u32()),
            _ => {}
        }
    }

    /// Decode a grpprl on top of these (base) properties
    pub fn apply_sprms(&mut self, sprms: &SprmBuffer) -> Result<()> {
        for op in sprms.iter() {
            self.apply_sprm(&op?);
        }
        Ok(())
    }
}

/// Compress `props` into the sprms that differ from `base`
pub fn compress_paragraph(props: &ParagraphProperties, base: &ParagraphProperties) -> Vec<u8> {
    let mut buf = SprmBuffer::new();
    let flag = |b: bool| [b as u8];

    if props.justification != base.justification {
        buf.append(sprm::SPRM_P_JC, &[props.justification.code()]);
    }
    if props.keep_on_page != base.keep_on_page {
        buf.append(sprm::SPRM_P_F_KEEP, &flag(props.keep_on_page));
    }
    if props.keep_with_next != base.keep_with_next {
        buf.append(sprm::SPRM_P_F_KEEP_FOLLOW, &flag(props.keep_with_next));
    }
    if props.page_break_before != base.page_break_before {
        buf.append(sprm::SPRM_P_F_PAGE_BREAK_BEFORE, &flag(props.page_break_before));
    }
    if props.widow_control != base.widow_control {
        buf.append(sprm::SPRM_P_F_WIDOW_CONTROL, &flag(props.widow_control));
    }
    if props.ilvl != base.ilvl {
        buf.append(sprm::SPRM_P_ILVL, &[props.ilvl]);
    }
    if props.ilfo != base.ilfo {
        buf.append(sprm::SPRM_P_ILFO, &props.ilfo.to_le_bytes());
    }
    if props.indent_right != base.indent_right {
        buf.append(sprm::SPRM_P_DXA_RIGHT, &props.indent_right.to_le_bytes());
    }
    if props.indent_left != base.indent_left {
        buf.append(sprm::SPRM_P_DXA_LEFT, &props.indent_left.to_le_bytes());
    }
    if props.first_line_indent != base.first_line_indent {
        buf.append(sprm::SPRM_P_DXA_LEFT1, &props.first_line_indent.to_le_bytes());
    }
    if props.line_spacing != base.line_spacing {
        buf.append(sprm::SPRM_P_DYA_LINE, &props.line_spacing.to_u32().to_le_bytes());
    }
    if props.spacing_before != base.spacing_before {
        buf.append(sprm::SPRM_P_DYA_BEFORE, &props.spacing_before.to_le_bytes());
    }
    if props.spacing_after != base.spacing_after {
        buf.append(sprm::SPRM_P_DYA_AFTER, &props.spacing_after.to_le_bytes());
    }
    if props.in_table != base.in_table {
        buf.append(sprm::SPRM_P_F_IN_TABLE, &flag(props.in_table));
    }
    if props.table_row_end != base.table_row_end {
        buf.append(sprm::SPRM_P_F_TTP, &flag(props.table_row_end));
    }
    if props.inner_table_cell != base.inner_table_cell {
        buf.append(sprm::SPRM_P_F_INNER_TABLE_CELL, &flag(props.inner_table_cell));
    }
    if props.inner_table_row_end != base.inner_table_row_end {
        buf.append(sprm::SPRM_P_F_INNER_TTP, &flag(props.inner_table_row_end));
    }
    if props.table_depth != base.table_depth {
        buf.append(sprm::SPRM_P_ITAP, &props.table_depth.to_le_bytes());
    }
    if props.outline_level != base.outline_level {
        buf.append(sprm::SPRM_P_OUT_LVL, &[props.outline_level]);
    }
    let borders = [
        (sprm::SPRM_P_BRC_TOP, props.border_top, base.border_top),
        (sprm::SPRM_P_BRC_LEFT, props.border_left, base.border_left),
        (sprm::SPRM_P_BRC_BOTTOM, props.border_bottom, base.border_bottom),
        (sprm::SPRM_P_BRC_RIGHT, props.border_right, base.border_right),
    ];
    for (opcode, brc, base_brc) in borders {
        if brc != base_brc {
            buf.append(opcode, &brc.to_u32().to_le_bytes());
        }
    }

    buf.as_bytes().to_vec()
}

/// Payload of a paragraph table node: a style index plus a grpprl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Papx {
    pub istd: u16,
    pub sprms: SprmBuffer,
}

impl Papx {
    pub fn new(istd: u16, sprms: SprmBuffer) -> Self {
        Self { istd, sprms }
    }

    /// Compress `props` against the paragraph style it names
    pub fn compress(props: &ParagraphProperties, istd: u16, styles: &StyleSheet) -> Result<Self> {
        let base = styles.paragraph_style(istd);
        let sprms = SprmBuffer::from_bytes(compress_paragraph(props, &base))?;
        Ok(Self { istd, sprms })
    }

    /// Decode against the paragraph style this node names
    pub fn properties(&self, styles: &StyleSheet) -> Result<ParagraphProperties> {
        let mut props = styles.paragraph_style(self.istd);
        props.istd = self.istd;
        props.apply_sprms(&self.sprms)?;
        Ok(props)
    }
}

impl NodePayload for Papx {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_then_decode() {
        let styles = StyleSheet::default();
        let props = ParagraphProperties {
            justification: Justification::Center,
            indent_left: 720,
            spacing_after: 120,
            keep_with_next: true,
            border_bottom: BorderCode::single(4),
            ..Default::default()
        };
        let papx = Papx::compress(&props, 0, &styles).unwrap();
        assert!(!papx.sprms.is_empty());
        assert_eq!(papx.properties(&styles).unwrap(), props);
    }

    #[test]
    fn test_identical_props_compress_to_nothing() {
        let base = ParagraphProperties::default();
        assert!(compress_paragraph(&base, &base).is_empty());
    }

    #[test]
    fn test_table_level() {
        let mut props = ParagraphProperties::default();
        assert_eq!(props.table_level(), 0);
        props.in_table = true;
        assert_eq!(props.table_level(), 1);
        props.table_depth = 2;
        assert_eq!(props.table_level(), 2);
        props.inner_table_row_end = true;
        assert!(props.is_table_row_end());
    }

    #[test]
    fn test_line_spacing_packing() {
        let lspd = LineSpacing {
            line: 360,
            multiple: true,
        };
        assert_eq!(LineSpacing::from_u32(lspd.to_u32()), lspd);
        let exact = LineSpacing {
            line: -280,
            multiple: false,
        };
        assert_eq!(LineSpacing::from_u32(exact.to_u32()), exact);
    }
}

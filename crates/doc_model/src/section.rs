//! Section properties (SEP) and their compressed form (SEPX)

use crate::sprm::{self, SprmBuffer, SprmOperation};
use crate::{NodePayload, Result};
use serde::{Deserialize, Serialize};

/// How a section starts relative to the previous one (bkc)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionBreak {
    Continuous,
    NewColumn,
    #[default]
    NewPage,
    EvenPage,
    OddPage,
}

impl SectionBreak {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => SectionBreak::Continuous,
            1 => SectionBreak::NewColumn,
            3 => SectionBreak::EvenPage,
            4 => SectionBreak::OddPage,
            _ => SectionBreak::NewPage,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            SectionBreak::Continuous => 0,
            SectionBreak::NewColumn => 1,
            SectionBreak::NewPage => 2,
            SectionBreak::EvenPage => 3,
            SectionBreak::OddPage => 4,
        }
    }
}

/// Decoded section properties. Measurements are in twips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionProperties {
    pub break_kind: SectionBreak,
    pub title_page: bool,
    pub columns: u16,
    pub column_spacing: u16,
    pub line_between: bool,
    /// Page number format (nfc)
    pub page_number_format: u8,
    pub landscape: bool,
    pub page_width: u16,
    pub page_height: u16,
    pub margin_left: u16,
    pub margin_right: u16,
    pub margin_top: i16,
    pub margin_bottom: i16,
}

impl Default for SectionProperties {
    fn default() -> Self {
        // US Letter with 1.25" side and 1" top/bottom margins
        Self {
            break_kind: SectionBreak::NewPage,
            title_page: false,
            columns: 1,
            column_spacing: 720,
            line_between: false,
            page_number_format: 0,
            landscape: false,
            page_width: 12240,
            page_height: 15840,
            margin_left: 1800,
            margin_right: 1800,
            margin_top: 1440,
            margin_bottom: 1440,
        }
    }
}

impl SectionProperties {
    /// Apply one section sprm. Sprms of other groups are ignored.
    pub fn apply_sprm(&mut self, op: &SprmOperation<'_>) {
        match op.opcode {
            sprm::SPRM_S_BKC => self.break_kind = SectionBreak::from_code(op.operand_u8()),
            sprm::SPRM_S_F_TITLE_PAGE => self.title_page = op.operand_u8() != 0,
            // stored as the number of columns minus one
            sprm::SPRM_S_CCOLUMNS => self.columns = op.operand_u16().saturating_add(1),
            sprm::SPRM_S_DXA_COLUMNS => self.column_spacing = op.operand_u16(),
            sprm::SPRM_S_L_BETWEEN => self.line_between = op.operand_u8() != 0,
            sprm::SPRM_S_NFC_PGN => self.page_number_format = op.operand_u8(),
            sprm::SPRM_S_B_ORIENTATION => self.landscape = op.operand_u8() == 2,
            sprm::SPRM_S_XA_PAGE => self.page_width = op.operand_u16(),
            sprm::SPRM_S_YA_PAGE => self.page_height = op.operand_u16(),
            sprm::SPRM_S_DXA_LEFT => self.margin_left = op.operand_u16(),
            sprm::SPRM_S_DXA_RIGHT => self.margin_right = op.operand_u16(),
            sprm::SPRM_S_DYA_TOP => self.margin_top = op.operand_i16(),
            sprm::SPRM_S_DYA_BOTTOM => self.margin_bottom = op.operand_i16(),
            _ => {}
        }
    }

    pub fn apply_sprms(&mut self, sprms: &SprmBuffer) -> Result<()> {
        for op in sprms.iter() {
            self.apply_sprm(&op?);
        }
        Ok(())
    }
}

/// Compress `props` into the sprms that differ from the defaults
pub fn compress_section(props: &SectionProperties) -> Vec<u8> {
    let base = SectionProperties::default();
    let mut buf = SprmBuffer::new();

    if props.break_kind != base.break_kind {
        buf.append(sprm::SPRM_S_BKC, &[props.break_kind.code()]);
    }
    if props.title_page != base.title_page {
        buf.append(sprm::SPRM_S_F_TITLE_PAGE, &[props.title_page as u8]);
    }
    if props.columns != base.columns {
        let stored = props.columns.saturating_sub(1);
        buf.append(sprm::SPRM_S_CCOLUMNS, &stored.to_le_bytes());
    }
    if props.column_spacing != base.column_spacing {
        buf.append(sprm::SPRM_S_DXA_COLUMNS, &props.column_spacing.to_le_bytes());
    }
    if props.line_between != base.line_between {
        buf.append(sprm::SPRM_S_L_BETWEEN, &[props.line_between as u8]);
    }
    if props.page_number_format != base.page_number_format {
        buf.append(sprm::SPRM_S_NFC_PGN, &[props.page_number_format]);
    }
    if props.landscape != base.landscape {
        buf.append(sprm::SPRM_S_B_ORIENTATION, &[if props.landscape { 2 } else { 1 }]);
    }
    let measures = [
        (sprm::SPRM_S_XA_PAGE, props.page_width, base.page_width),
        (sprm::SPRM_S_YA_PAGE, props.page_height, base.page_height),
        (sprm::SPRM_S_DXA_LEFT, props.margin_left, base.margin_left),
        (sprm::SPRM_S_DXA_RIGHT, props.margin_right, base.margin_right),
    ];
    for (opcode, value, base_value) in measures {
        if value != base_value {
            buf.append(opcode, &value.to_le_bytes());
        }
    }
    if props.margin_top != base.margin_top {
        buf.append(sprm::SPRM_S_DYA_TOP, &props.margin_top.to_le_bytes());
    }
    if props.margin_bottom != base.margin_bottom {
        buf.append(sprm::SPRM_S_DYA_BOTTOM, &props.margin_bottom.to_le_bytes());
    }

    buf.as_bytes().to_vec()
}

/// Payload of a section table node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sepx {
    pub sprms: SprmBuffer,
}

impl Sepx {
    pub fn new(sprms: SprmBuffer) -> Self {
        Self { sprms }
    }

    pub fn compress(props: &SectionProperties) -> Result<Self> {
        Ok(Self {
            sprms: SprmBuffer::from_bytes(compress_section(props))?,
        })
    }

    pub fn properties(&self) -> Result<SectionProperties> {
        let mut props = SectionProperties::default();
        props.apply_sprms(&self.sprms)?;
        Ok(props)
    }
}

impl NodePayload for Sepx {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_then_decode() {
        let props = SectionProperties {
            break_kind: SectionBreak::Continuous,
            columns: 2,
            landscape: true,
            page_width: 15840,
            page_height: 12240,
            margin_top: 720,
            ..Default::default()
        };
        let sepx = Sepx::compress(&props).unwrap();
        assert_eq!(sepx.properties().unwrap(), props);
    }

    #[test]
    fn test_default_section_is_empty_grpprl() {
        let sepx = Sepx::compress(&SectionProperties::default()).unwrap();
        assert!(sepx.sprms.is_empty());
    }
}

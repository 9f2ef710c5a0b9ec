//! SPRM codec - compressed, incremental property modifications
//!
//! A grpprl is a sequence of `(opcode, operand)` pairs. The 16-bit opcode
//! packs the operation index (bits 0-8), a "special" flag (bit 9), the
//! property group (bits 10-12) and the operand size code `spra`
//! (bits 13-15). Operand sizes follow the size code, with `spra == 6` meaning
//! a length-prefixed operand.

use crate::{DocModelError, Result};
use serde::{Deserialize, Serialize};

/// Property group encoded in an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SprmGroup {
    Paragraph,
    Character,
    Picture,
    Section,
    Table,
    Unknown(u8),
}

// Character sprms
pub const SPRM_C_ISTD: u16 = 0x4A30;
pub const SPRM_C_F_BOLD: u16 = 0x0835;
pub const SPRM_C_F_ITALIC: u16 = 0x0836;
pub const SPRM_C_F_STRIKE: u16 = 0x0837;
pub const SPRM_C_F_OUTLINE: u16 = 0x0838;
pub const SPRM_C_F_SHADOW: u16 = 0x0839;
pub const SPRM_C_F_SMALL_CAPS: u16 = 0x083A;
pub const SPRM_C_F_CAPS: u16 = 0x083B;
pub const SPRM_C_F_VANISH: u16 = 0x083C;
pub const SPRM_C_F_SPEC: u16 = 0x0855;
pub const SPRM_C_KUL: u16 = 0x2A3E;
pub const SPRM_C_ICO: u16 = 0x2A42;
pub const SPRM_C_HPS: u16 = 0x4A43;
pub const SPRM_C_ISS: u16 = 0x2A48;
pub const SPRM_C_RG_FTC0: u16 = 0x4A4F;
pub const SPRM_C_DXA_SPACE: u16 = 0x8840;

// Paragraph sprms
pub const SPRM_P_JC: u16 = 0x2403;
pub const SPRM_P_F_KEEP: u16 = 0x2405;
pub const SPRM_P_F_KEEP_FOLLOW: u16 = 0x2406;
pub const SPRM_P_F_PAGE_BREAK_BEFORE: u16 = 0x2407;
pub const SPRM_P_ILVL: u16 = 0x260A;
pub const SPRM_P_ILFO: u16 = 0x460B;
pub const SPRM_P_DXA_RIGHT: u16 = 0x840E;
pub const SPRM_P_DXA_LEFT: u16 = 0x840F;
pub const SPRM_P_DXA_LEFT1: u16 = 0x8411;
pub const SPRM_P_DYA_LINE: u16 = 0x6412;
pub const SPRM_P_DYA_BEFORE: u16 = 0xA413;
pub const SPRM_P_DYA_AFTER: u16 = 0xA414;
pub const SPRM_P_F_IN_TABLE: u16 = 0x2416;
pub const SPRM_P_F_TTP: u16 = 0x2417;
pub const SPRM_P_BRC_TOP: u16 = 0x6424;
pub const SPRM_P_BRC_LEFT: u16 = 0x6425;
pub const SPRM_P_BRC_BOTTOM: u16 = 0x6426;
pub const SPRM_P_BRC_RIGHT: u16 = 0x6427;
pub const SPRM_P_F_WIDOW_CONTROL: u16 = 0x2431;
pub const SPRM_P_F_INNER_TABLE_CELL: u16 = 0x244B;
pub const SPRM_P_F_INNER_TTP: u16 = 0x244C;
pub const SPRM_P_OUT_LVL: u16 = 0x2640;
pub const SPRM_P_ITAP: u16 = 0x6649;

// Section sprms
pub const SPRM_S_BKC: u16 = 0x3009;
pub const SPRM_S_F_TITLE_PAGE: u16 = 0x300A;
pub const SPRM_S_CCOLUMNS: u16 = 0x500B;
pub const SPRM_S_DXA_COLUMNS: u16 = 0x900C;
pub const SPRM_S_NFC_PGN: u16 = 0x300E;
pub const SPRM_S_L_BETWEEN: u16 = 0x3019;
pub const SPRM_S_B_ORIENTATION: u16 = 0x301D;
pub const SPRM_S_XA_PAGE: u16 = 0xB01F;
pub const SPRM_S_YA_PAGE: u16 = 0xB020;
pub const SPRM_S_DXA_LEFT: u16 = 0xB021;
pub const SPRM_S_DXA_RIGHT: u16 = 0xB022;
pub const SPRM_S_DYA_TOP: u16 = 0x9023;
pub const SPRM_S_DYA_BOTTOM: u16 = 0x9024;

// Table sprms (carried by row-end paragraphs)
pub const SPRM_T_JC: u16 = 0x5400;
pub const SPRM_T_F_CANT_SPLIT: u16 = 0x3403;
pub const SPRM_T_TABLE_HEADER: u16 = 0x3404;
pub const SPRM_T_DYA_ROW_HEIGHT: u16 = 0x9407;
pub const SPRM_T_DXA_GAP_HALF: u16 = 0x9602;
pub const SPRM_T_DEF_TABLE: u16 = 0xD608;

/// Operand value of a toggle sprm meaning "same as the style"
pub const TOGGLE_AS_STYLE: u8 = 0x80;
/// Operand value of a toggle sprm meaning "opposite of the style"
pub const TOGGLE_INVERT_STYLE: u8 = 0x81;

/// The operation index (bits 0-8) of an opcode
pub fn operation(opcode: u16) -> u16 {
    opcode & 0x01FF
}

/// The property group (bits 10-12) of an opcode
pub fn group(opcode: u16) -> SprmGroup {
    match ((opcode >> 10) & 0x7) as u8 {
        1 => SprmGroup::Paragraph,
        2 => SprmGroup::Character,
        3 => SprmGroup::Picture,
        4 => SprmGroup::Section,
        5 => SprmGroup::Table,
        other => SprmGroup::Unknown(other),
    }
}

/// Operand size code (bits 13-15)
pub fn size_code(opcode: u16) -> u8 {
    ((opcode >> 13) & 0x7) as u8
}

/// Fixed operand size for an opcode, `None` for length-prefixed operands
pub fn fixed_operand_size(opcode: u16) -> Option<usize> {
    match size_code(opcode) {
        0 | 1 => Some(1),
        2 | 4 | 5 => Some(2),
        3 => Some(4),
        7 => Some(3),
        _ => None,
    }
}

/// One decoded sprm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SprmOperation<'a> {
    pub opcode: u16,
    /// Byte offset of the opcode within the grpprl
    pub offset: usize,
    pub operand: &'a [u8],
}

impl SprmOperation<'_> {
    pub fn group(&self) -> SprmGroup {
        group(self.opcode)
    }

    pub fn operand_u8(&self) -> u8 {
        self.operand.first().copied().unwrap_or(0)
    }

    pub fn operand_u16(&self) -> u16 {
        match self.operand {
            [a, b, ..] => u16::from_le_bytes([*a, *b]),
            [a] => *a as u16,
            [] => 0,
        }
    }

    pub fn operand_i16(&self) -> i16 {
        self.operand_u16() as i16
    }

    pub fn operand_u32(&self) -> u32 {
        match self.operand {
            [a, b, c, d, ..] => u32::from_le_bytes([*a, *b, *c, *d]),
            _ => self.operand_u16() as u32,
        }
    }

    pub fn operand_i32(&self) -> i32 {
        self.operand_u32() as i32
    }

    /// Total encoded size: opcode, any length prefix, and the operand
    pub fn encoded_len(&self) -> usize {
        2 + prefix_len(self.opcode) + self.operand.len()
    }
}

fn prefix_len(opcode: u16) -> usize {
    match fixed_operand_size(opcode) {
        Some(_) => 0,
        None if opcode == SPRM_T_DEF_TABLE => 2,
        None => 1,
    }
}

/// Iterator over the sprms of a grpprl
#[derive(Debug, Clone)]
pub struct SprmIter<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for SprmIter<'a> {
    type Item = Result<SprmOperation<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.bytes.len() {
            return None;
        }
        let offset = self.offset;
        let result = decode_at(self.bytes, offset);
        match &result {
            Ok(op) => self.offset += op.encoded_len(),
            Err(_) => self.offset = self.bytes.len(),
        }
        Some(result)
    }
}

fn decode_at(bytes: &[u8], offset: usize) -> Result<SprmOperation<'_>> {
    let truncated = || DocModelError::MalformedSprm(format!("truncated sprm at byte {}", offset));
    let head = bytes.get(offset..offset + 2).ok_or_else(truncated)?;
    let opcode = u16::from_le_bytes([head[0], head[1]]);
    let mut pos = offset + 2;

    let size = match fixed_operand_size(opcode) {
        Some(size) => size,
        None if opcode == SPRM_T_DEF_TABLE => {
            let prefix = bytes.get(pos..pos + 2).ok_or_else(truncated)?;
            pos += 2;
            u16::from_le_bytes([prefix[0], prefix[1]]) as usize
        }
        None => {
            let size = *bytes.get(pos).ok_or_else(truncated)? as usize;
            pos += 1;
            size
        }
    };

    let operand = bytes.get(pos..pos + size).ok_or_else(truncated)?;
    Ok(SprmOperation {
        opcode,
        offset,
        operand,
    })
}

/// Encode one sprm
pub fn encode(opcode: u16, operand: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + operand.len());
    out.extend_from_slice(&opcode.to_le_bytes());
    match fixed_operand_size(opcode) {
        Some(size) => {
            let mut operand = operand.to_vec();
            operand.resize(size, 0);
            out.extend_from_slice(&operand);
        }
        None if opcode == SPRM_T_DEF_TABLE => {
            out.extend_from_slice(&(operand.len() as u16).to_le_bytes());
            out.extend_from_slice(operand);
        }
        None => {
            out.push(operand.len().min(u8::MAX as usize) as u8);
            out.extend_from_slice(&operand[..operand.len().min(u8::MAX as usize)]);
        }
    }
    out
}

/// A growable grpprl attached to a property node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprmBuffer {
    bytes: Vec<u8>,
}

impl SprmBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap raw grpprl bytes, validating their framing
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let buffer = Self { bytes };
        for op in buffer.iter() {
            op?;
        }
        Ok(buffer)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn iter(&self) -> SprmIter<'_> {
        SprmIter {
            bytes: &self.bytes,
            offset: 0,
        }
    }

    /// Last occurrence of `opcode`, which is the one that wins when applied
    pub fn find(&self, opcode: u16) -> Option<SprmOperation<'_>> {
        self.iter()
            .filter_map(|op| op.ok())
            .filter(|op| op.opcode == opcode)
            .last()
    }

    /// Append a sprm
    pub fn append(&mut self, opcode: u16, operand: &[u8]) {
        self.bytes.extend(encode(opcode, operand));
    }

    /// Append raw grpprl bytes
    pub fn append_grpprl(&mut self, grpprl: &[u8]) {
        self.bytes.extend_from_slice(grpprl);
    }

    /// Replace every occurrence of `opcode` with a single sprm carrying `operand`
    pub fn update(&mut self, opcode: u16, operand: &[u8]) {
        self.remove(opcode);
        self.append(opcode, operand);
    }

    /// Remove every occurrence of `opcode`. Returns whether anything was removed.
    pub fn remove(&mut self, opcode: u16) -> bool {
        let spans: Vec<(usize, usize)> = self
            .iter()
            .filter_map(|op| op.ok())
            .filter(|op| op.opcode == opcode)
            .map(|op| (op.offset, op.encoded_len()))
            .collect();
        for &(offset, len) in spans.iter().rev() {
            self.bytes.drain(offset..offset + len);
        }
        !spans.is_empty()
    }
}

/// Resolve a toggle operand against the style's value
pub fn toggle(operand: u8, style_value: bool) -> bool {
    match operand {
        0 => false,
        1 => true,
        TOGGLE_AS_STYLE => style_value,
        TOGGLE_INVERT_STYLE => !style_value,
        _ => style_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_fields() {
        assert_eq!(group(SPRM_C_F_BOLD), SprmGroup::Character);
        assert_eq!(group(SPRM_P_JC), SprmGroup::Paragraph);
        assert_eq!(group(SPRM_S_BKC), SprmGroup::Section);
        assert_eq!(group(SPRM_T_DEF_TABLE), SprmGroup::Table);
        assert_eq!(fixed_operand_size(SPRM_C_F_BOLD), Some(1));
        assert_eq!(fixed_operand_size(SPRM_C_HPS), Some(2));
        assert_eq!(fixed_operand_size(SPRM_P_ITAP), Some(4));
        assert_eq!(fixed_operand_size(SPRM_T_DEF_TABLE), None);
        assert_eq!(operation(SPRM_C_F_BOLD), 0x35);
    }

    #[test]
    fn test_buffer_update_keeps_single_copy() {
        let mut buf = SprmBuffer::new();
        buf.append(SPRM_C_F_BOLD, &[1]);
        buf.append(SPRM_C_HPS, &24u16.to_le_bytes());
        buf.append(SPRM_C_F_BOLD, &[0]);
        assert_eq!(buf.find(SPRM_C_F_BOLD).unwrap().operand_u8(), 0);

        buf.update(SPRM_C_F_BOLD, &[1]);
        let bolds = buf
            .iter()
            .filter_map(|op| op.ok())
            .filter(|op| op.opcode == SPRM_C_F_BOLD)
            .count();
        assert_eq!(bolds, 1);
        assert_eq!(buf.find(SPRM_C_HPS).unwrap().operand_u16(), 24);
        assert!(buf.remove(SPRM_C_HPS));
        assert!(!buf.remove(SPRM_C_HPS));
    }

    #[test]
    fn test_variable_length_operands() {
        let mut buf = SprmBuffer::new();
        buf.append(SPRM_T_DEF_TABLE, &[2, 0, 0, 0, 1, 0, 2]);
        buf.append(SPRM_C_ICO, &[6]);
        let ops: Vec<_> = buf.iter().map(|op| op.unwrap()).collect();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].operand.len(), 7);
        assert_eq!(ops[1].operand_u8(), 6);
        assert!(SprmBuffer::from_bytes(buf.as_bytes().to_vec()).is_ok());
    }

    #[test]
    fn test_truncated_grpprl_is_rejected() {
        let bytes = vec![0x43, 0x4A, 0x18];
        assert!(matches!(
            SprmBuffer::from_bytes(bytes),
            Err(DocModelError::MalformedSprm(_))
        ));
    }

    #[test]
    fn test_toggle() {
        assert!(toggle(1, false));
        assert!(!toggle(0, true));
        assert!(toggle(TOGGLE_AS_STYLE, true));
        assert!(toggle(TOGGLE_INVERT_STYLE, false));
    }
}

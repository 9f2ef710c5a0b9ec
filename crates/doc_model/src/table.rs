//! Table properties (TAP) carried by row-end paragraphs
//!
//! Word stores a table row's layout on the paragraph that closes the row:
//! the column count, the cell edges, and one descriptor per cell, all packed
//! into a single `sprmTDefTable` operand.

use crate::sprm::{self, SprmBuffer, SprmOperation};
use crate::{BorderCode, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Cell Merge State
// =============================================================================

/// Horizontal merge state for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HorizontalMerge {
    #[default]
    None,
    /// Cell starts a horizontal merge
    Start,
    /// Cell is covered by the start cell to its left
    Continue,
}

/// Vertical merge state for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalMerge {
    #[default]
    None,
    /// Cell starts a vertical merge
    Start,
    /// Cell is covered by the cell above
    Continue,
}

/// Vertical alignment within a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellVerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

// =============================================================================
// Cell Descriptor
// =============================================================================

/// Encoded size of one cell descriptor inside `sprmTDefTable`
pub const CELL_DESCRIPTOR_SIZE: usize = 20;

/// Per-cell descriptor (TC)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCellDescriptor {
    pub h_merge: HorizontalMerge,
    pub v_merge: VerticalMerge,
    pub vertical: bool,
    pub backward: bool,
    pub rotate_font: bool,
    pub vertical_align: CellVerticalAlign,
    pub border_top: BorderCode,
    pub border_left: BorderCode,
    pub border_bottom: BorderCode,
    pub border_right: BorderCode,
}

impl TableCellDescriptor {
    fn read(bytes: &[u8]) -> Self {
        let flags = u16::from_le_bytes([bytes[0], bytes[1]]);
        let brc = |at: usize| {
            BorderCode::from_u32(u32::from_le_bytes([
                bytes[at],
                bytes[at + 1],
                bytes[at + 2],
                bytes[at + 3],
            ]))
        };
        let h_merge = match (flags & 0x0001 != 0, flags & 0x0002 != 0) {
            (true, _) => HorizontalMerge::Start,
            (false, true) => HorizontalMerge::Continue,
            _ => HorizontalMerge::None,
        };
        let v_merge = match (flags & 0x0040 != 0, flags & 0x0020 != 0) {
            (true, _) => VerticalMerge::Start,
            (false, true) => VerticalMerge::Continue,
            _ => VerticalMerge::None,
        };
        let vertical_align = match (flags >> 7) & 0x3 {
            1 => CellVerticalAlign::Center,
            2 => CellVerticalAlign::Bottom,
            _ => CellVerticalAlign::Top,
        };
        Self {
            h_merge,
            v_merge,
            vertical: flags & 0x0004 != 0,
            backward: flags & 0x0008 != 0,
            rotate_font: flags & 0x0010 != 0,
            vertical_align,
            border_top: brc(4),
            border_left: brc(8),
            border_bottom: brc(12),
            border_right: brc(16),
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        let mut flags: u16 = 0;
        match self.h_merge {
            HorizontalMerge::Start => flags |= 0x0001,
            HorizontalMerge::Continue => flags |= 0x0002,
            HorizontalMerge::None => {}
        }
        if self.vertical {
            flags |= 0x0004;
        }
        if self.backward {
            flags |= 0x0008;
        }
        if self.rotate_font {
            flags |= 0x0010;
        }
        match self.v_merge {
            VerticalMerge::Start => flags |= 0x0040 | 0x0020,
            VerticalMerge::Continue => flags |= 0x0020,
            VerticalMerge::None => {}
        }
        flags |= match self.vertical_align {
            CellVerticalAlign::Top => 0,
            CellVerticalAlign::Center => 1 << 7,
            CellVerticalAlign::Bottom => 2 << 7,
        };
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&[0, 0]);
        for brc in [
            self.border_top,
            self.border_left,
            self.border_bottom,
            self.border_right,
        ] {
            out.extend_from_slice(&brc.to_u32().to_le_bytes());
        }
    }
}

// =============================================================================
// Table Properties
// =============================================================================

/// Decoded table row properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableProperties {
    /// Row justification (0 left, 1 center, 2 right)
    pub justification: u16,
    /// Half the gap between cells, in twips
    pub gap_half: i16,
    pub cant_split: bool,
    pub header_row: bool,
    /// Row height in twips; negative means exact
    pub row_height: i16,
    /// Column count (itcMac)
    pub column_count: u8,
    /// `column_count + 1` cell edges, in twips
    pub cell_edges: Vec<i16>,
    pub cells: Vec<TableCellDescriptor>,
}

impl TableProperties {
    /// Evenly spaced columns across `width` twips
    pub fn with_columns(columns: u8, width: i16) -> Self {
        let step = if columns == 0 { 0 } else { width / columns as i16 };
        Self {
            column_count: columns,
            cell_edges: (0..=columns as i16).map(|i| i * step).collect(),
            cells: vec![TableCellDescriptor::default(); columns as usize],
            ..Default::default()
        }
    }

    /// Left edge and width of cell `index`; zero when the row carries no edges
    pub fn cell_geometry(&self, index: usize) -> (i16, i16) {
        match (self.cell_edges.get(index), self.cell_edges.get(index + 1)) {
            (Some(&left), Some(&right)) => (left, right - left),
            (Some(&left), None) => (left, 0),
            _ => (0, 0),
        }
    }

    /// Descriptor of cell `index`, or the default when the row has fewer
    pub fn cell_descriptor(&self, index: usize) -> TableCellDescriptor {
        self.cells.get(index).copied().unwrap_or_default()
    }

    pub fn apply_sprm(&mut self, op: &SprmOperation<'_>) {
        match op.opcode {
            sprm::SPRM_T_JC => self.justification = op.operand_u16(),
            sprm::SPRM_T_DXA_GAP_HALF => self.gap_half = op.operand_i16(),
            sprm::SPRM_T_F_CANT_SPLIT => self.cant_split = op.operand_u8() != 0,
            sprm::SPRM_T_TABLE_HEADER => self.header_row = op.operand_u8() != 0,
            sprm::SPRM_T_DYA_ROW_HEIGHT => self.row_height = op.operand_i16(),
            sprm::SPRM_T_DEF_TABLE => self.apply_def_table(op.operand),
            _ => {}
        }
    }

    /// Decode the table sprms of a row-end paragraph's grpprl
    pub fn from_sprms(sprms: &SprmBuffer) -> Result<Self> {
        let mut props = Self::default();
        for op in sprms.iter() {
            props.apply_sprm(&op?);
        }
        Ok(props)
    }

    fn apply_def_table(&mut self, operand: &[u8]) {
        let Some((&count, rest)) = operand.split_first() else {
            return;
        };
        let edges_len = (count as usize + 1) * 2;
        let edges = &rest[..edges_len.min(rest.len())];

        self.column_count = count;
        self.cell_edges = edges
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        // descriptors may be truncated; missing ones take the default
        self.cells = rest
            .get(edges_len..)
            .unwrap_or_default()
            .chunks_exact(CELL_DESCRIPTOR_SIZE)
            .take(count as usize)
            .map(TableCellDescriptor::read)
            .collect();
    }

    fn def_table_operand(&self) -> Vec<u8> {
        let mut out = vec![self.column_count];
        for edge in &self.cell_edges {
            out.extend_from_slice(&edge.to_le_bytes());
        }
        for cell in &self.cells {
            cell.write(&mut out);
        }
        out
    }
}

/// Compress table properties into the sprms a row-end paragraph carries
pub fn compress_table(props: &TableProperties) -> Vec<u8> {
    let base = TableProperties::default();
    let mut buf = SprmBuffer::new();

    if props.justification != base.justification {
        buf.append(sprm::SPRM_T_JC, &props.justification.to_le_bytes());
    }
    if props.gap_half != base.gap_half {
        buf.append(sprm::SPRM_T_DXA_GAP_HALF, &props.gap_half.to_le_bytes());
    }
    if props.cant_split {
        buf.append(sprm::SPRM_T_F_CANT_SPLIT, &[1]);
    }
    if props.header_row {
        buf.append(sprm::SPRM_T_TABLE_HEADER, &[1]);
    }
    if props.row_height != base.row_height {
        buf.append(sprm::SPRM_T_DYA_ROW_HEIGHT, &props.row_height.to_le_bytes());
    }
    if props.column_count > 0 {
        buf.append(sprm::SPRM_T_DEF_TABLE, &props.def_table_operand());
    }

    buf.as_bytes().to_vec()
}

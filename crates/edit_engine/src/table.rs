//! Tables - paragraphs re-segmented into rows and cells
//!
//! A table is a run of in-table paragraphs at one nesting level. A paragraph
//! flagged as a row end at that level closes a row and carries the row's
//! table properties. Within a row, a paragraph ending in the cell mark (or
//! flagged as an embedded cell mark, for nested tables) closes a cell.
//! Paragraphs of deeper tables are plain cell content until a table is built
//! from within the cell.
//!
//! Row and cell boundaries are captured when the table is built; they do not
//! follow later edits.

use crate::editing::Side;
use crate::{DocumentEditor, EditError, Paragraph, RangeId, RangeKind, Result, TextRange};
use doc_model::sprm;
use doc_model::{
    compress_table, CellVerticalAlign, DocModelError, HorizontalMerge, ParagraphProperties,
    PropertyKind, TableCellDescriptor, TableProperties, VerticalMerge, CELL_MARK,
    DEFAULT_TABLE_WIDTH, NIL_STYLE,
};

// =============================================================================
// Table
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    id: RangeId,
    level: i32,
    /// Paragraph index spans `[first, last]` of each row, relative to the table
    rows: Vec<(usize, usize)>,
}

impl DocumentEditor {
    /// Build the table that starts at `paragraph`, a paragraph taken from
    /// `parent`
    pub fn table(&mut self, parent: RangeId, paragraph: &Paragraph) -> Result<Table> {
        let para_id = paragraph.range_id();
        let para_start = self.start(para_id)?;
        if !paragraph.is_in_table() {
            return Err(EditError::NotInTable(para_start));
        }
        if self.parent(para_id)? != Some(parent) {
            return Err(EditError::NotChildOfRange(parent));
        }

        let level = paragraph.table_level();
        let first = self.paragraph_node(para_id)?;
        let (window_start, window_end) = self.window(parent, PropertyKind::Paragraph)?;
        if first > window_start {
            let prev = self.doc.paragraph_properties(first - 1)?;
            if prev.in_table && prev.table_level() == level {
                return Err(EditError::NotFirstInTable(para_start));
            }
        }

        let mut last = first;
        while last + 1 < window_end {
            let next = self.doc.paragraph_properties(last + 1)?;
            if !next.in_table || next.table_level() < level {
                break;
            }
            last += 1;
        }
        if last + 1 == window_end && last + 1 < self.doc.table_len(PropertyKind::Paragraph) {
            let next = self.doc.paragraph_properties(last + 1)?;
            if next.in_table && next.table_level() >= level {
                tracing::warn!(
                    "table at {} continues past its parent range, clipping",
                    para_start
                );
            }
        }

        let start = self.clipped_span(parent, PropertyKind::Paragraph, first)?.0;
        let end = self.clipped_span(parent, PropertyKind::Paragraph, last)?.1;
        let id = self.child(parent, start, end, RangeKind::Table)?;

        let mut rows = Vec::new();
        let mut row_start = first;
        for node in first..=last {
            let props = self.doc.paragraph_properties(node)?;
            if props.table_level() == level && props.is_table_row_end() {
                rows.push((row_start - first, node - first));
                row_start = node + 1;
            }
        }
        if row_start <= last {
            tracing::warn!(
                "table at {} ends with {} paragraphs outside any row",
                start,
                last + 1 - row_start
            );
        }

        tracing::trace!("table [{}, {}) level {} with {} rows", start, end, level, rows.len());
        Ok(Table { id, level, rows })
    }

    /// Insert an empty table of `rows` x `columns` at the start of the range
    pub fn insert_table_before(&mut self, id: RangeId, columns: u8, rows: usize) -> Result<Table> {
        let start = self.start(id)?;
        let cell = ParagraphProperties::table_cell();
        let row_end = ParagraphProperties {
            table_row_end: true,
            ..ParagraphProperties::table_cell()
        };
        let table_sprms =
            compress_table(&TableProperties::with_columns(columns, DEFAULT_TABLE_WIDTH));

        // every paragraph goes in at the same position, so build the table
        // back to front
        for _ in 0..rows {
            self.insert_paragraph(
                id,
                Side::Before,
                &row_end,
                NIL_STYLE,
                CELL_MARK,
                Some(&table_sprms),
            )?;
            for _ in 0..columns {
                self.insert_paragraph(id, Side::Before, &cell, NIL_STYLE, CELL_MARK, None)?;
            }
        }

        let length = rows * (columns as usize + 1);
        let span = self.sub_range(id, start, start + length)?;
        let first = self.paragraph(span, 0)?;
        self.table(span, &first)
    }

    /// Whether the paragraph node's last character is the cell mark
    fn ends_with_cell_mark(&self, id: RangeId, node: usize) -> Result<bool> {
        let (start, end) = self.clipped_span(id, PropertyKind::Paragraph, node)?;
        if start >= end {
            return Ok(false);
        }
        let (x, y) = self.doc.find_range(PropertyKind::Text, 0, end - 1, end);
        let last = self.doc.text().text_in_window(x, y, end - 1, end);
        Ok(last.starts_with(CELL_MARK))
    }

    /// Paragraph node range of a span of paragraphs, relative to `id`'s window
    fn paragraph_span(
        &self,
        id: RangeId,
        first: usize,
        last: usize,
    ) -> Result<(usize, usize, usize, usize)> {
        let first = self.node_index(id, PropertyKind::Paragraph, first)?;
        let last = self.node_index(id, PropertyKind::Paragraph, last)?;
        let start = self.clipped_span(id, PropertyKind::Paragraph, first)?.0;
        let end = self.clipped_span(id, PropertyKind::Paragraph, last)?.1;
        Ok((first, last, start, end))
    }
}

impl Table {
    pub fn range_id(&self) -> RangeId {
        self.id
    }

    /// Nesting level; 1 for a top-level table
    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, editor: &mut DocumentEditor, index: usize) -> Result<TableRow> {
        let &(first, last) = self.rows.get(index).ok_or(EditError::TableIndexOutOfBounds {
            what: "row",
            index,
            len: self.rows.len(),
        })?;
        let (first_node, last_node, start, end) = editor.paragraph_span(self.id, first, last)?;
        let props = editor.doc.table_properties(last_node)?;
        let id = editor.child(self.id, start, end, RangeKind::TableRow)?;

        let mut cells = Vec::new();
        let mut cell_start = first_node;
        for node in first_node..=last_node {
            let para = editor.doc.paragraph_properties(node)?;
            let closes = editor.ends_with_cell_mark(id, node)? || para.inner_table_cell;
            if closes && para.table_level() == self.level {
                cells.push((cell_start - first_node, node - first_node));
                cell_start = node + 1;
            }
        }
        if cell_start < last_node {
            cells.push((cell_start - first_node, last_node - first_node));
        }
        // the row-end paragraph is not a cell of its own
        if let Some(&(a, b)) = cells.last() {
            let props = editor.doc.paragraph_properties(first_node + a)?;
            if a == b && props.is_table_row_end() {
                cells.pop();
            }
        }

        let expected = props.column_count as usize;
        if cells.len() != expected {
            if editor.doc.settings().strict_table_cells {
                return Err(DocModelError::MalformedTable {
                    start,
                    end,
                    found: cells.len(),
                    expected,
                }
                .into());
            }
            tracing::warn!(
                "table row [{}, {}) has {} cells, expected {}",
                start,
                end,
                cells.len(),
                expected
            );
        }

        Ok(TableRow {
            id,
            level: self.level,
            props,
            cells,
            row_end: last - first,
        })
    }

    pub fn rows(&self, editor: &mut DocumentEditor) -> Result<Vec<TableRow>> {
        (0..self.rows.len()).map(|i| self.row(editor, i)).collect()
    }
}

impl TextRange for Table {
    fn range_id(&self) -> RangeId {
        Table::range_id(self)
    }
}

// =============================================================================
// TableRow
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    id: RangeId,
    level: i32,
    props: TableProperties,
    /// Paragraph index spans `[first, last]` of each cell, relative to the row
    cells: Vec<(usize, usize)>,
    /// Index of the row-end paragraph within the row
    row_end: usize,
}

impl DocumentEditor {
    fn update_row(&mut self, row: &TableRow, opcode: u16, operand: &[u8]) -> Result<()> {
        let node = self.node_index(row.id, PropertyKind::Paragraph, row.row_end)?;
        self.doc
            .paragraphs_mut()
            .payload_mut(node)?
            .sprms
            .update(opcode, operand);
        Ok(())
    }
}

impl TableRow {
    pub fn range_id(&self) -> RangeId {
        self.id
    }

    pub fn properties(&self) -> &TableProperties {
        &self.props
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, editor: &mut DocumentEditor, index: usize) -> Result<TableCell> {
        let &(first, last) = self.cells.get(index).ok_or(EditError::TableIndexOutOfBounds {
            what: "cell",
            index,
            len: self.cells.len(),
        })?;
        let (_, _, start, end) = editor.paragraph_span(self.id, first, last)?;
        let id = editor.child(self.id, start, end, RangeKind::TableCell)?;
        let (left_edge, width) = self.props.cell_geometry(index);
        Ok(TableCell {
            id,
            level: self.level,
            descriptor: self.props.cell_descriptor(index),
            left_edge,
            width,
        })
    }

    pub fn cells(&self, editor: &mut DocumentEditor) -> Result<Vec<TableCell>> {
        (0..self.cells.len()).map(|i| self.cell(editor, i)).collect()
    }

    pub fn cant_split(&self) -> bool {
        self.props.cant_split
    }

    pub fn set_cant_split(&mut self, editor: &mut DocumentEditor, value: bool) -> Result<()> {
        editor.update_row(self, sprm::SPRM_T_F_CANT_SPLIT, &[value as u8])?;
        self.props.cant_split = value;
        Ok(())
    }

    /// Whether the row repeats as a header on every page
    pub fn is_header_row(&self) -> bool {
        self.props.header_row
    }

    pub fn set_header_row(&mut self, editor: &mut DocumentEditor, value: bool) -> Result<()> {
        editor.update_row(self, sprm::SPRM_T_TABLE_HEADER, &[value as u8])?;
        self.props.header_row = value;
        Ok(())
    }

    pub fn row_height(&self) -> i16 {
        self.props.row_height
    }

    pub fn set_row_height(&mut self, editor: &mut DocumentEditor, twips: i16) -> Result<()> {
        editor.update_row(self, sprm::SPRM_T_DYA_ROW_HEIGHT, &twips.to_le_bytes())?;
        self.props.row_height = twips;
        Ok(())
    }

    pub fn justification(&self) -> u16 {
        self.props.justification
    }

    pub fn set_justification(&mut self, editor: &mut DocumentEditor, jc: u16) -> Result<()> {
        editor.update_row(self, sprm::SPRM_T_JC, &jc.to_le_bytes())?;
        self.props.justification = jc;
        Ok(())
    }

    pub fn gap_half(&self) -> i16 {
        self.props.gap_half
    }

    pub fn set_gap_half(&mut self, editor: &mut DocumentEditor, twips: i16) -> Result<()> {
        editor.update_row(self, sprm::SPRM_T_DXA_GAP_HALF, &twips.to_le_bytes())?;
        self.props.gap_half = twips;
        Ok(())
    }
}

impl TextRange for TableRow {
    fn range_id(&self) -> RangeId {
        TableRow::range_id(self)
    }
}

// =============================================================================
// TableCell
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    id: RangeId,
    level: i32,
    descriptor: TableCellDescriptor,
    left_edge: i16,
    width: i16,
}

impl TableCell {
    pub fn range_id(&self) -> RangeId {
        self.id
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn descriptor(&self) -> &TableCellDescriptor {
        &self.descriptor
    }

    /// Left edge in twips
    pub fn left_edge(&self) -> i16 {
        self.left_edge
    }

    pub fn width(&self) -> i16 {
        self.width
    }

    pub fn horizontal_merge(&self) -> HorizontalMerge {
        self.descriptor.h_merge
    }

    pub fn vertical_merge(&self) -> VerticalMerge {
        self.descriptor.v_merge
    }

    pub fn vertical_align(&self) -> CellVerticalAlign {
        self.descriptor.vertical_align
    }

    pub fn is_vertical(&self) -> bool {
        self.descriptor.vertical
    }
}

impl TextRange for TableCell {
    fn range_id(&self) -> RangeId {
        TableCell::range_id(self)
    }
}

//! Integration tests for table segmentation and table edits

use doc_model::{DocumentBuilder, ModelSettings, TableProperties};
use edit_engine::{DocumentEditor, EditError, TextRange};

fn three_by_two() -> DocumentEditor {
    let doc = DocumentBuilder::new()
        .paragraph("Before")
        .table_row(&["A", "B"])
        .table_row(&["C", "D"])
        .table_row(&["E", "F"])
        .paragraph("After")
        .build()
        .unwrap();
    DocumentEditor::new(doc)
}

#[test]
fn test_three_by_two_segmentation() {
    let mut ed = three_by_two();
    let all = ed.overall_range();
    let first = ed.paragraph(all, 1).unwrap();
    let table = ed.table(all, &first).unwrap();
    assert_eq!(table.num_rows(), 3);

    let expected = [["A\u{7}", "B\u{7}"], ["C\u{7}", "D\u{7}"], ["E\u{7}", "F\u{7}"]];
    for (i, row) in table.rows(&mut ed).unwrap().iter().enumerate() {
        assert_eq!(row.num_cells(), 2);
        let texts: Vec<String> = row
            .cells(&mut ed)
            .unwrap()
            .iter()
            .map(|cell| cell.text(&ed).unwrap())
            .collect();
        assert_eq!(texts, expected[i]);
    }
}

#[test]
fn test_editing_a_cell_keeps_the_table_consistent() {
    let mut ed = three_by_two();
    let all = ed.overall_range();
    let first = ed.paragraph(all, 1).unwrap();
    let table = ed.table(all, &first).unwrap();
    let row = table.row(&mut ed, 1).unwrap();
    let cell = row.cell(&mut ed, 0).unwrap();
    ed.insert_before(cell.range_id(), "x").unwrap();

    // views built after the edit see the new text
    let first = ed.paragraph(all, 1).unwrap();
    let table = ed.table(all, &first).unwrap();
    let row = table.row(&mut ed, 1).unwrap();
    let cell = row.cell(&mut ed, 0).unwrap();
    assert_eq!(cell.text(&ed).unwrap(), "xC\u{7}");
    assert_eq!(row.num_cells(), 2);
    ed.sanity_check(all).unwrap();
}

#[test]
fn test_inserted_table_in_empty_document() {
    let doc = DocumentBuilder::new().build().unwrap();
    let mut ed = DocumentEditor::new(doc);
    let all = ed.overall_range();
    let table = ed.insert_table_before(all, 3, 2).unwrap();
    assert_eq!(table.num_rows(), 2);
    let row = table.row(&mut ed, 0).unwrap();
    assert_eq!(row.num_cells(), 3);
    let cell = row.cell(&mut ed, 2).unwrap();
    assert_eq!(cell.left_edge(), 5760);
    assert_eq!(ed.text(all).unwrap().chars().count(), 9);
    ed.sanity_check(all).unwrap();
}

#[test]
fn test_strict_settings_reject_short_rows() {
    let doc = DocumentBuilder::new()
        .settings(ModelSettings {
            strict_table_cells: true,
            ..Default::default()
        })
        .table_row_with(1, &["only"], TableProperties::with_columns(2, 4000))
        .build()
        .unwrap();
    let mut ed = DocumentEditor::new(doc);
    let all = ed.overall_range();
    let first = ed.paragraph(all, 0).unwrap();
    let table = ed.table(all, &first).unwrap();
    let err = table.row(&mut ed, 0).unwrap_err();
    assert!(matches!(err, EditError::DocModel(_)));
    assert!(err.to_string().contains("found 1 cells, expected 2"));
}

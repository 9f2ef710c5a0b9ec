//! Integration tests for range views and structural edits
//!
//! These build documents through the builder, edit them through range views
//! and check that every property table keeps covering the text.

use doc_model::{DocumentBuilder, PropertyKind, Story};
use edit_engine::{DocumentEditor, TextRange};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn sample() -> DocumentEditor {
    let doc = DocumentBuilder::new()
        .paragraph("The quick brown fox")
        .paragraph("jumps over")
        .paragraph("the lazy dog")
        .build()
        .unwrap();
    DocumentEditor::new(doc)
}

/// Total covered length of every property table
fn table_lengths(ed: &DocumentEditor) -> [usize; 4] {
    let doc = ed.document();
    [
        doc.text().total_length(),
        doc.runs().total_length(),
        doc.paragraphs().total_length(),
        doc.sections().total_length(),
    ]
}

#[test]
fn test_insert_then_read_through_fresh_paragraph() {
    init_tracing();
    let mut ed = sample();
    let all = ed.overall_range();
    let para = ed.paragraph(all, 1).unwrap();
    let before = para.text(&ed).unwrap();

    let inner = ed.sub_range(para.range_id(), 20, 25).unwrap();
    ed.insert_after(inner, " high").unwrap();

    let fresh = ed.paragraph(all, 1).unwrap();
    let after = fresh.text(&ed).unwrap();
    assert_eq!(after.chars().count(), before.chars().count() + 5);
    assert_eq!(after, "jumps high over\r");
    assert_eq!(ed.span(para.range_id()).unwrap(), (20, 36));
    ed.sanity_check(all).unwrap();
}

#[test]
fn test_delete_reduces_every_table_by_its_length() {
    init_tracing();
    let mut ed = sample();
    let all = ed.overall_range();
    let lengths = table_lengths(&ed);
    let story = ed.document().stories().length(Story::Main);

    // spans the first paragraph mark
    let doomed = ed.sub_range(all, 16, 26).unwrap();
    ed.delete(doomed).unwrap();

    for (old, new) in lengths.iter().zip(table_lengths(&ed)) {
        assert_eq!(old - 10, new);
    }
    assert_eq!(ed.document().stories().length(Story::Main), story - 10);
    assert_eq!(ed.text(all).unwrap(), "The quick brown over\rthe lazy dog\r");
    // both touched paragraphs survive, clipped
    assert_eq!(ed.num_paragraphs(all).unwrap(), 3);
    ed.sanity_check(all).unwrap();
}

#[test]
fn test_stale_sibling_is_re_resolved() {
    init_tracing();
    let mut ed = sample();
    let all = ed.overall_range();
    let last = ed.paragraph(all, 2).unwrap();
    assert_eq!(last.num_character_runs(&ed).unwrap(), 1);

    let first = ed.paragraph(all, 0).unwrap();
    ed.insert_paragraph_before(first.range_id(), &Default::default(), 0)
        .unwrap();

    // the sibling's cached windows predate the insert
    assert!(ed.is_stale(last.range_id()).unwrap());
    ed.reset(last.range_id()).unwrap();
    assert!(!ed.is_stale(last.range_id()).unwrap());
    assert_eq!(ed.num_paragraphs(all).unwrap(), 4);
}

#[test]
fn test_stories_are_separate_ranges() {
    init_tracing();
    let doc = DocumentBuilder::new()
        .paragraph("Body")
        .story(Story::Footnote)
        .paragraph("Note")
        .build()
        .unwrap();
    let mut ed = DocumentEditor::new(doc);
    let note = ed.story_range(Story::Footnote);
    let word = ed.sub_range(note, 5, 9).unwrap();
    ed.insert_after(word, "!").unwrap();

    assert_eq!(ed.document().stories().length(Story::Main), 5);
    assert_eq!(ed.document().stories().length(Story::Footnote), 6);
    assert_eq!(ed.text(note).unwrap(), "Note!\r");
    let main = ed.story_range(Story::Main);
    assert_eq!(ed.text(main).unwrap(), "Body\r");
}

#[test]
fn test_insert_at_story_start_grows_that_story() {
    init_tracing();
    let doc = DocumentBuilder::new()
        .paragraph("Body")
        .story(Story::Footnote)
        .paragraph("Note")
        .build()
        .unwrap();
    let mut ed = DocumentEditor::new(doc);
    let note = ed.story_range(Story::Footnote);
    ed.insert_before(note, "X").unwrap();

    assert_eq!(ed.text(note).unwrap(), "XNote\r");
    assert_eq!(ed.document().stories().length(Story::Main), 5);
    assert_eq!(ed.document().stories().length(Story::Footnote), 6);
    let main = ed.story_range(Story::Main);
    assert_eq!(ed.text(main).unwrap(), "Body\r");
    let fresh = ed.story_range(Story::Footnote);
    assert_eq!(ed.text(fresh).unwrap(), "XNote\r");

    // an empty range on the boundary joins the story before it
    let boundary = ed.range(5, 5).unwrap();
    ed.insert_before(boundary, "!").unwrap();
    assert_eq!(ed.document().stories().length(Story::Main), 6);
    assert_eq!(ed.document().stories().length(Story::Footnote), 6);
    let main = ed.story_range(Story::Main);
    assert_eq!(ed.text(main).unwrap(), "Body\r!");
    ed.sanity_check(main).unwrap();
}

#[test]
fn test_repeated_traversal_reuses_views() {
    let mut ed = sample();
    let all = ed.overall_range();
    for _ in 0..1000 {
        let paragraphs = ed.paragraphs(all).unwrap();
        assert_eq!(paragraphs.len(), 3);
        ed.character_run(all, 0).unwrap();
    }
    // the overall range, three paragraphs and one run
    assert_eq!(ed.live_ranges(), 5);

    let first = ed.paragraph(all, 0).unwrap();
    assert_eq!(first, ed.paragraph(all, 0).unwrap());
    // an explicit sub-range is always a view of its own
    let a = ed.sub_range(all, 0, 3).unwrap();
    let b = ed.sub_range(all, 0, 3).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_bookmarks_and_fields_are_reachable() {
    init_tracing();
    let doc = DocumentBuilder::new()
        .paragraph("0123456789AB\u{13}PAGE\u{14}1\u{15}")
        .bookmark("outer", 10, 14)
        .bookmark("inner", 10, 12)
        .build()
        .unwrap();
    let mut ed = DocumentEditor::new(doc);

    let at_ten = ed.document().bookmarks().bookmarks_at(10);
    let names: Vec<_> = at_ten.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["inner", "outer"]);

    let field = ed
        .document()
        .fields()
        .field_by_start_offset(Story::Main, 12)
        .unwrap();
    assert_eq!(field.end(), 19);

    let all = ed.overall_range();
    assert_eq!(ed.text_without_fields(all).unwrap(), "0123456789AB1\r");
}

// =============================================================================
// Property tests
// =============================================================================

#[derive(Debug, Clone)]
enum Edit {
    InsertBefore(usize, usize, String),
    InsertAfter(usize, usize, String),
    Delete(usize, usize),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<usize>(), any::<usize>(), "[a-z \r]{1,6}")
            .prop_map(|(a, b, s)| Edit::InsertBefore(a, b, s)),
        (any::<usize>(), any::<usize>(), "[a-z]{1,6}")
            .prop_map(|(a, b, s)| Edit::InsertAfter(a, b, s)),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Edit::Delete(a, b)),
    ]
}

/// Map two arbitrary numbers onto a span of `[0, limit]`
fn span(a: usize, b: usize, limit: usize) -> (usize, usize) {
    let start = a % (limit + 1);
    let end = start + b % (limit - start + 1);
    (start, end)
}

proptest! {
    #[test]
    fn test_tables_keep_covering_text(edits in prop::collection::vec(edit_strategy(), 1..12)) {
        let mut ed = sample();
        for edit in edits {
            let len = ed.document().length();
            let all = ed.overall_range();
            match edit {
                Edit::InsertBefore(a, b, text) => {
                    let (s, e) = span(a, b, len);
                    let r = ed.sub_range(all, s, e).unwrap();
                    ed.insert_before(r, &text).unwrap();
                    prop_assert_eq!(ed.len(r).unwrap(), e - s + text.chars().count());
                }
                Edit::InsertAfter(a, b, text) => {
                    let (s, e) = span(a, b, len);
                    let r = ed.sub_range(all, s, e).unwrap();
                    ed.insert_after(r, &text).unwrap();
                }
                Edit::Delete(a, b) => {
                    // keep the final character so no table empties out
                    let (s, e) = span(a, b, len - 1);
                    let r = ed.sub_range(all, s, e).unwrap();
                    ed.delete(r).unwrap();
                    prop_assert_eq!(ed.document().length(), len - (e - s));
                }
            }

            let total = ed.document().length();
            prop_assert_eq!(ed.document().stories().length(Story::Main), total);
            for kind in PropertyKind::EDIT_ORDER {
                prop_assert!(ed.document().table_len(kind) > 0);
            }
            prop_assert_eq!(table_lengths(&ed), [total; 4]);
            prop_assert!(ed.document().sanity_check().is_ok());
            prop_assert_eq!(ed.span(all).unwrap(), (0, total));
            ed.release(all).unwrap();
        }
    }

    #[test]
    fn test_range_text_matches_full_text(a in any::<usize>(), b in any::<usize>()) {
        let mut ed = sample();
        let full: Vec<char> = ed.document().full_text().chars().collect();
        let (s, e) = span(a, b, full.len());
        let r = ed.range(s, e).unwrap();
        let expected: String = full[s..e].iter().collect();
        prop_assert_eq!(ed.text(r).unwrap(), expected);
        prop_assert!(ed.sanity_check(r).is_ok());
    }
}

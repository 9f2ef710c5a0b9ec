//! Document - the property tables and the auxiliary structures that own them
//!
//! A document owns one table per property kind, all covering the same
//! character-position space, plus the style sheet, list tables, story
//! counters, fields and bookmarks. [`DocumentBuilder`] assembles a consistent
//! document in memory.

use crate::{
    compress_table, scan_field_markers, Bookmarks, CharacterProperties, Chpx, DocModelError,
    Fields, ListTables, ModelSettings, Papx, ParagraphProperties, PropertyKind, PropertyNode,
    PropertyTable, Result, SectionProperties, Sepx, Story, StoryLengths, StyleDescription,
    StyleSheet, TableProperties, TextTable, CELL_MARK, PARAGRAPH_MARK,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default table width used by [`DocumentBuilder::table_row`], in twips
pub const DEFAULT_TABLE_WIDTH: i16 = 8640;

// =============================================================================
// Document
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    text: TextTable,
    sections: PropertyTable<Sepx>,
    paragraphs: PropertyTable<Papx>,
    runs: PropertyTable<Chpx>,
    styles: StyleSheet,
    lists: ListTables,
    stories: StoryLengths,
    fields: Fields,
    bookmarks: Bookmarks,
    settings: ModelSettings,
}

impl Document {
    /// Assemble a document from its four tables. Every table must cover the
    /// text; the whole text is counted as the main story.
    pub fn from_tables(
        text: TextTable,
        sections: PropertyTable<Sepx>,
        paragraphs: PropertyTable<Papx>,
        runs: PropertyTable<Chpx>,
    ) -> Result<Self> {
        let mut stories = StoryLengths::new();
        stories.set_length(Story::Main, text.total_length());
        let doc = Self {
            text,
            sections,
            paragraphs,
            runs,
            styles: StyleSheet::default(),
            lists: ListTables::default(),
            stories,
            fields: Fields::default(),
            bookmarks: Bookmarks::default(),
            settings: ModelSettings::default(),
        };
        doc.sanity_check()?;
        Ok(doc)
    }

    pub fn with_styles(mut self, styles: StyleSheet) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_lists(mut self, lists: ListTables) -> Self {
        self.lists = lists;
        self
    }

    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_bookmarks(mut self, bookmarks: Bookmarks) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the story counters; they must add up to the text length
    pub fn with_story_lengths(mut self, stories: StoryLengths) -> Result<Self> {
        self.stories = stories;
        self.sanity_check()?;
        Ok(self)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn text(&self) -> &TextTable {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut TextTable {
        &mut self.text
    }

    pub fn sections(&self) -> &PropertyTable<Sepx> {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut PropertyTable<Sepx> {
        &mut self.sections
    }

    pub fn paragraphs(&self) -> &PropertyTable<Papx> {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut PropertyTable<Papx> {
        &mut self.paragraphs
    }

    pub fn runs(&self) -> &PropertyTable<Chpx> {
        &self.runs
    }

    pub fn runs_mut(&mut self) -> &mut PropertyTable<Chpx> {
        &mut self.runs
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    pub fn lists(&self) -> &ListTables {
        &self.lists
    }

    pub fn lists_mut(&mut self) -> &mut ListTables {
        &mut self.lists
    }

    pub fn stories(&self) -> &StoryLengths {
        &self.stories
    }

    pub fn stories_mut(&mut self) -> &mut StoryLengths {
        &mut self.stories
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    pub fn bookmarks(&self) -> &Bookmarks {
        &self.bookmarks
    }

    pub fn bookmarks_mut(&mut self) -> &mut Bookmarks {
        &mut self.bookmarks
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ModelSettings) {
        self.settings = settings;
    }

    /// Total character count
    pub fn length(&self) -> usize {
        self.text.total_length()
    }

    pub fn full_text(&self) -> String {
        self.text.full_text()
    }

    /// Text of one story
    pub fn story_text(&self, story: Story) -> String {
        let span = self.stories.range(story);
        let (from, to) = self.text.find_range(0, span.start, span.end);
        self.text.text_in_window(from, to, span.start, span.end)
    }

    /// Generation of the table of `kind`
    pub fn generation(&self, kind: PropertyKind) -> u64 {
        match kind {
            PropertyKind::Section => self.sections.generation(),
            PropertyKind::Paragraph => self.paragraphs.generation(),
            PropertyKind::CharacterRun => self.runs.generation(),
            PropertyKind::Text => self.text.generation(),
        }
    }

    /// Node count of the table of `kind`
    pub fn table_len(&self, kind: PropertyKind) -> usize {
        match kind {
            PropertyKind::Section => self.sections.len(),
            PropertyKind::Paragraph => self.paragraphs.len(),
            PropertyKind::CharacterRun => self.runs.len(),
            PropertyKind::Text => self.text.len(),
        }
    }

    /// Span of node `index` in the table of `kind`
    pub fn node_span(&self, kind: PropertyKind, index: usize) -> Result<(usize, usize)> {
        fn span<T: crate::NodePayload>(
            table: &PropertyTable<T>,
            index: usize,
        ) -> Result<(usize, usize)> {
            let node = table.node(index)?;
            Ok((node.start(), node.end()))
        }
        match kind {
            PropertyKind::Section => span(&self.sections, index),
            PropertyKind::Paragraph => span(&self.paragraphs, index),
            PropertyKind::CharacterRun => span(&self.runs, index),
            PropertyKind::Text => span(&self.text, index),
        }
    }

    /// Index window of `kind` nodes overlapping `[start, end)`
    pub fn find_range(
        &self,
        kind: PropertyKind,
        hint: usize,
        start: usize,
        end: usize,
    ) -> (usize, usize) {
        match kind {
            PropertyKind::Section => self.sections.find_range(hint, start, end),
            PropertyKind::Paragraph => self.paragraphs.find_range(hint, start, end),
            PropertyKind::CharacterRun => self.runs.find_range(hint, start, end),
            PropertyKind::Text => self.text.find_range(hint, start, end),
        }
    }

    // -------------------------------------------------------------------------
    // Decoded properties
    // -------------------------------------------------------------------------

    pub fn paragraph_properties(&self, index: usize) -> Result<ParagraphProperties> {
        self.paragraphs.node(index)?.payload().properties(&self.styles)
    }

    pub fn section_properties(&self, index: usize) -> Result<SectionProperties> {
        self.sections.node(index)?.payload().properties()
    }

    /// Table properties carried by paragraph `index` (a row end)
    pub fn table_properties(&self, index: usize) -> Result<TableProperties> {
        TableProperties::from_sprms(&self.paragraphs.node(index)?.payload().sprms)
    }

    /// Style index of the paragraph holding `cp`; 0 when none does
    pub fn paragraph_style_at(&self, cp: usize) -> u16 {
        self.paragraphs
            .index_containing(cp)
            .and_then(|i| self.paragraphs.get(i))
            .map(|n| n.payload().istd)
            .unwrap_or(0)
    }

    /// Run properties, decoded against the enclosing paragraph's style
    pub fn character_properties(&self, index: usize) -> Result<CharacterProperties> {
        let node = self.runs.node(index)?;
        let istd = self.paragraph_style_at(node.start());
        node.payload().properties(istd, &self.styles)
    }

    /// Check that every table covers the text and the story counters add up
    pub fn sanity_check(&self) -> Result<()> {
        let total = self.length();
        self.text.check_coverage(total)?;
        self.runs.check_coverage(total)?;
        self.paragraphs.check_coverage(total)?;
        self.sections.check_coverage(total)?;
        if self.stories.total() != total {
            return Err(DocModelError::CoverageViolation {
                kind: PropertyKind::Text,
                detail: format!(
                    "story lengths add up to {} but the text has {} characters",
                    self.stories.total(),
                    total
                ),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Builder
// =============================================================================

#[derive(Debug, Clone)]
struct PendingParagraph {
    props: ParagraphProperties,
    runs: Vec<(String, CharacterProperties)>,
    table: Option<TableProperties>,
    story: Story,
}

impl PendingParagraph {
    fn char_len(&self) -> usize {
        self.runs.iter().map(|(t, _)| t.chars().count()).sum()
    }
}

/// Builds a consistent [`Document`] one paragraph at a time.
///
/// Paragraph text is given without its terminating mark; the builder appends
/// `\r`, or `\u{7}` for table cells and row ends.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    styles: StyleSheet,
    lists: ListTables,
    settings: ModelSettings,
    paragraphs: Vec<PendingParagraph>,
    /// (paragraph count at the break, properties of the closed section)
    section_breaks: Vec<(usize, SectionProperties)>,
    last_section: SectionProperties,
    story: Story,
    bookmarks: Vec<(String, usize, usize)>,
    cp: usize,
    error: Option<String>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styles(mut self, styles: StyleSheet) -> Self {
        self.styles = styles;
        self
    }

    pub fn style(mut self, istd: u16, style: StyleDescription) -> Self {
        self.styles.set_style(istd, style);
        self
    }

    pub fn lists(mut self, lists: ListTables) -> Self {
        self.lists = lists;
        self
    }

    pub fn settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Current character position
    pub fn position(&self) -> usize {
        self.cp
    }

    /// A paragraph in the Normal style with default run properties
    pub fn paragraph(self, text: &str) -> Self {
        self.paragraph_with(
            ParagraphProperties::default(),
            vec![(text.to_string(), CharacterProperties::default())],
        )
    }

    /// A paragraph with an explicit style index
    pub fn styled_paragraph(self, istd: u16, text: &str) -> Self {
        let props = self.styles.paragraph_style(istd);
        let chp = self.styles.character_style(istd);
        self.paragraph_with(props, vec![(text.to_string(), chp)])
    }

    /// A list paragraph
    pub fn list_paragraph(self, ilfo: u16, ilvl: u8, text: &str) -> Self {
        let props = ParagraphProperties {
            ilfo,
            ilvl,
            ..Default::default()
        };
        self.paragraph_with(props, vec![(text.to_string(), CharacterProperties::default())])
    }

    /// A paragraph made of runs; the style index comes from `props.istd`
    pub fn paragraph_with(
        mut self,
        props: ParagraphProperties,
        mut runs: Vec<(String, CharacterProperties)>,
    ) -> Self {
        let mark_props = runs
            .last()
            .map(|(_, chp)| chp.clone())
            .unwrap_or_else(|| self.styles.character_style(props.istd));
        runs.push((PARAGRAPH_MARK.to_string(), mark_props));
        self.push_paragraph(props, merge_mark(runs), None);
        self
    }

    /// A top-level table row with evenly spaced columns
    pub fn table_row(self, cells: &[&str]) -> Self {
        let props = TableProperties::with_columns(cells.len() as u8, DEFAULT_TABLE_WIDTH);
        self.table_row_with(1, cells, props)
    }

    /// A table row at nesting `depth` (1 for top level) with explicit table
    /// properties, one single-paragraph cell per entry of `cells`
    pub fn table_row_with(mut self, depth: i32, cells: &[&str], table: TableProperties) -> Self {
        for cell in cells {
            self = self.cell_paragraph(depth, cell);
        }
        self.row_end(depth, table)
    }

    /// An in-table paragraph at `depth` that doesn't close its cell
    pub fn table_paragraph(mut self, depth: i32, text: &str) -> Self {
        let props = ParagraphProperties {
            in_table: true,
            table_depth: depth.max(1),
            ..Default::default()
        };
        let text = format!("{}{}", text, PARAGRAPH_MARK);
        self.push_paragraph(props, vec![(text, CharacterProperties::default())], None);
        self
    }

    /// The paragraph closing a cell at `depth`. Top-level cells end with the
    /// cell mark; nested cells end with `\r` and carry the inner-cell flag.
    pub fn cell_paragraph(mut self, depth: i32, text: &str) -> Self {
        let depth = depth.max(1);
        let nested = depth > 1;
        let props = ParagraphProperties {
            in_table: true,
            table_depth: depth,
            inner_table_cell: nested,
            ..Default::default()
        };
        let text = format!("{}{}", text, cell_terminator(depth));
        self.push_paragraph(props, vec![(text, CharacterProperties::default())], None);
        self
    }

    /// The paragraph closing a row at `depth`, carrying the row's table
    /// properties
    pub fn row_end(mut self, depth: i32, table: TableProperties) -> Self {
        let depth = depth.max(1);
        let nested = depth > 1;
        let props = ParagraphProperties {
            in_table: true,
            table_depth: depth,
            table_row_end: !nested,
            inner_table_row_end: nested,
            ..Default::default()
        };
        let mark = cell_terminator(depth).to_string();
        self.push_paragraph(props, vec![(mark, CharacterProperties::default())], Some(table));
        self
    }

    /// Close the current section with `props`; later paragraphs open a new one
    pub fn end_section(mut self, props: SectionProperties) -> Self {
        self.section_breaks.push((self.paragraphs.len(), props));
        self
    }

    /// Properties of the final section
    pub fn last_section(mut self, props: SectionProperties) -> Self {
        self.last_section = props;
        self
    }

    /// Continue in `story`. Stories must be visited in file order.
    pub fn story(mut self, story: Story) -> Self {
        if story < self.story {
            self.error = Some(format!(
                "story {:?} requested after {:?}",
                story, self.story
            ));
        }
        self.story = story;
        self
    }

    /// Bookmark `[start, end)` in absolute character positions
    pub fn bookmark(mut self, name: &str, start: usize, end: usize) -> Self {
        self.bookmarks.push((name.to_string(), start, end));
        self
    }

    pub fn build(mut self) -> Result<Document> {
        if let Some(error) = self.error.take() {
            return Err(DocModelError::InvalidBuilder(error));
        }
        if self.paragraphs.is_empty() {
            self = self.paragraph("");
        }

        let mut pieces = Vec::with_capacity(self.paragraphs.len());
        let mut paragraph_nodes = Vec::with_capacity(self.paragraphs.len());
        let mut run_nodes = Vec::new();
        let mut stories = StoryLengths::new();
        let mut story_text: HashMap<Story, String> = HashMap::new();
        let mut cp = 0;

        for para in &self.paragraphs {
            let start = cp;
            let mut text = String::new();
            for (run_text, chp) in &para.runs {
                let len = run_text.chars().count();
                let chpx = Chpx::compress(chp, para.props.istd, &self.styles)?;
                run_nodes.push(PropertyNode::new(cp, cp + len, chpx)?);
                text.push_str(run_text);
                cp += len;
            }

            let mut papx = Papx::compress(&para.props, para.props.istd, &self.styles)?;
            if let Some(table) = &para.table {
                papx.sprms.append_grpprl(&compress_table(table));
            }
            paragraph_nodes.push(PropertyNode::new(start, cp, papx)?);

            let len = cp - start;
            stories.set_length(para.story, stories.length(para.story) + len);
            story_text.entry(para.story).or_default().push_str(&text);
            pieces.push(text);
        }

        let mut section_nodes = Vec::new();
        let mut section_start = 0;
        let mut para_cp = Vec::with_capacity(self.paragraphs.len() + 1);
        para_cp.push(0);
        para_cp.extend(paragraph_nodes.iter().map(|n| n.end()));
        for (count, props) in &self.section_breaks {
            let end = para_cp[*count];
            if end > section_start {
                section_nodes.push(PropertyNode::new(section_start, end, Sepx::compress(props)?)?);
                section_start = end;
            }
        }
        section_nodes.push(PropertyNode::new(
            section_start,
            cp,
            Sepx::compress(&self.last_section)?,
        )?);

        let text = TextTable::from_pieces(pieces)?;
        let paragraphs = PropertyTable::from_nodes(PropertyKind::Paragraph, paragraph_nodes)?;
        let runs = PropertyTable::from_nodes(PropertyKind::CharacterRun, run_nodes)?;
        let sections = PropertyTable::from_nodes(PropertyKind::Section, section_nodes)?;

        let markers = story_text
            .iter()
            .map(|(story, text)| (*story, scan_field_markers(text, 0)))
            .filter(|(_, markers)| !markers.is_empty())
            .collect();

        let mut bookmarks = Bookmarks::new();
        for (name, start, end) in &self.bookmarks {
            if *end > cp {
                return Err(DocModelError::OffsetOutOfBounds {
                    offset: *end,
                    len: cp,
                });
            }
            bookmarks.add(name, *start, *end)?;
        }

        tracing::debug!(
            paragraphs = paragraphs.len(),
            runs = runs.len(),
            sections = sections.len(),
            length = cp,
            "built document"
        );

        Document::from_tables(text, sections, paragraphs, runs)?
            .with_styles(self.styles)
            .with_lists(self.lists)
            .with_fields(Fields::from_markers(markers))
            .with_bookmarks(bookmarks)
            .with_settings(self.settings)
            .with_story_lengths(stories)
    }

    fn push_paragraph(
        &mut self,
        props: ParagraphProperties,
        runs: Vec<(String, CharacterProperties)>,
        table: Option<TableProperties>,
    ) {
        let para = PendingParagraph {
            props,
            runs,
            table,
            story: self.story,
        };
        self.cp += para.char_len();
        self.paragraphs.push(para);
    }
}

fn cell_terminator(depth: i32) -> char {
    if depth > 1 {
        PARAGRAPH_MARK
    } else {
        CELL_MARK
    }
}

/// Fold the paragraph mark into the last run when both share properties
fn merge_mark(mut runs: Vec<(String, CharacterProperties)>) -> Vec<(String, CharacterProperties)> {
    if runs.len() >= 2 {
        let (mark, mark_props) = &runs[runs.len() - 1];
        let (_, prev_props) = &runs[runs.len() - 2];
        if mark_props == prev_props {
            let mark = mark.clone();
            runs.pop();
            if let Some((text, _)) = runs.last_mut() {
                text.push_str(&mark);
            }
        }
    }
    runs.retain(|(text, _)| !text.is_empty());
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldBoundary;

    #[test]
    fn test_build_simple_document() {
        let doc = DocumentBuilder::new()
            .paragraph("Hello")
            .paragraph("World")
            .build()
            .unwrap();
        assert_eq!(doc.full_text(), "Hello\rWorld\r");
        assert_eq!(doc.length(), 12);
        assert_eq!(doc.paragraphs().len(), 2);
        assert_eq!(doc.runs().len(), 2);
        assert_eq!(doc.sections().len(), 1);
        assert_eq!(doc.stories().length(Story::Main), 12);
        doc.sanity_check().unwrap();
    }

    #[test]
    fn test_empty_builder_has_one_paragraph() {
        let doc = DocumentBuilder::new().build().unwrap();
        assert_eq!(doc.full_text(), "\r");
        assert_eq!(doc.paragraphs().len(), 1);
    }

    #[test]
    fn test_runs_and_properties() {
        let bold = CharacterProperties {
            bold: true,
            ..Default::default()
        };
        let doc = DocumentBuilder::new()
            .paragraph_with(
                ParagraphProperties::default(),
                vec![
                    ("plain ".to_string(), CharacterProperties::default()),
                    ("bold".to_string(), bold),
                ],
            )
            .build()
            .unwrap();
        assert_eq!(doc.runs().len(), 2);
        assert!(!doc.character_properties(0).unwrap().bold);
        assert!(doc.character_properties(1).unwrap().bold);
        // the mark joined the bold run
        assert_eq!(doc.node_span(PropertyKind::CharacterRun, 1).unwrap(), (6, 11));
    }

    #[test]
    fn test_table_rows_and_sections() {
        let doc = DocumentBuilder::new()
            .paragraph("Intro")
            .end_section(SectionProperties {
                landscape: true,
                ..Default::default()
            })
            .table_row(&["a", "b"])
            .build()
            .unwrap();
        assert_eq!(doc.full_text(), "Intro\ra\u{7}b\u{7}\u{7}");
        assert_eq!(doc.sections().len(), 2);
        assert!(doc.section_properties(0).unwrap().landscape);
        assert!(!doc.section_properties(1).unwrap().landscape);

        let row_end = doc.paragraph_properties(3).unwrap();
        assert!(row_end.table_row_end);
        assert_eq!(doc.table_properties(3).unwrap().column_count, 2);
        assert!(doc.paragraph_properties(1).unwrap().in_table);
    }

    #[test]
    fn test_stories_fields_and_bookmarks() {
        let doc = DocumentBuilder::new()
            .paragraph("Page \u{13}PAGE\u{14}1\u{15}")
            .bookmark("Start", 0, 4)
            .story(Story::Footnote)
            .paragraph("note")
            .build()
            .unwrap();
        assert_eq!(doc.stories().length(Story::Main), 14);
        assert_eq!(doc.stories().length(Story::Footnote), 5);
        assert_eq!(doc.story_text(Story::Footnote), "note\r");

        let field = doc.fields().field_by_start_offset(Story::Main, 5).unwrap();
        assert_eq!(field.separator(), Some(10));
        assert_eq!(field.end(), 12);
        assert!(doc.fields().story(Story::Footnote).is_none());
        assert_eq!(FieldBoundary::from_char('\u{15}'), Some(FieldBoundary::End));

        assert_eq!(doc.bookmarks().bookmarks_at(0)[0].name, "Start");
    }

    #[test]
    fn test_builder_errors() {
        let err = DocumentBuilder::new()
            .story(Story::Comment)
            .story(Story::Main)
            .build();
        assert!(matches!(err, Err(DocModelError::InvalidBuilder(_))));

        let err = DocumentBuilder::new().paragraph("ab").bookmark("Far", 0, 99).build();
        assert!(matches!(err, Err(DocModelError::OffsetOutOfBounds { .. })));
    }

    #[test]
    fn test_from_tables_checks_coverage() {
        let text = TextTable::from_pieces(["abc\r"]).unwrap();
        let para = PropertyTable::from_nodes(
            PropertyKind::Paragraph,
            vec![PropertyNode::new(0, 4, Papx::default()).unwrap()],
        )
        .unwrap();
        let short_runs = PropertyTable::from_nodes(
            PropertyKind::CharacterRun,
            vec![PropertyNode::new(0, 3, Chpx::default()).unwrap()],
        )
        .unwrap();
        let sections = PropertyTable::from_nodes(
            PropertyKind::Section,
            vec![PropertyNode::new(0, 4, Sepx::default()).unwrap()],
        )
        .unwrap();
        let err = Document::from_tables(text, sections, para, short_runs);
        assert!(matches!(
            err,
            Err(DocModelError::CoverageViolation {
                kind: PropertyKind::CharacterRun,
                ..
            })
        ));
    }
}

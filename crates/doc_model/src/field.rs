//! Fields - begin / separator / end marker triples in a story's text
//!
//! A field is written in-band: a begin mark (0x13), the field code, an
//! optional separator (0x14) followed by the cached result, and an end mark
//! (0x15). Fields nest freely inside both the code and the result. The
//! per-story marker plex lists the position and descriptor of every mark;
//! [`Fields`] turns it into an explicit tree with O(1) lookup by start offset.

use crate::Story;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const FIELD_BEGIN_MARK: char = '\u{0013}';
pub const FIELD_SEPARATOR_MARK: char = '\u{0014}';
pub const FIELD_END_MARK: char = '\u{0015}';

/// Which of the three marks a plex entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldBoundary {
    Begin,
    Separator,
    End,
}

impl FieldBoundary {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            FIELD_BEGIN_MARK => Some(FieldBoundary::Begin),
            FIELD_SEPARATOR_MARK => Some(FieldBoundary::Separator),
            FIELD_END_MARK => Some(FieldBoundary::End),
            _ => None,
        }
    }
}

// Flags carried by end marks (grffld)
pub const FLD_DIFFER: u8 = 0x01;
pub const FLD_ZOMBIE_EMBED: u8 = 0x02;
pub const FLD_RESULT_DIRTY: u8 = 0x04;
pub const FLD_RESULT_EDITED: u8 = 0x08;
pub const FLD_LOCKED: u8 = 0x10;
pub const FLD_PRIVATE_RESULT: u8 = 0x20;
pub const FLD_NESTED: u8 = 0x40;
pub const FLD_HAS_SEP: u8 = 0x80;

/// Two-byte field descriptor (FLD)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub boundary: FieldBoundary,
    /// Field type (flt) on begin marks, flags (grffld) on end marks
    pub value: u8,
}

impl FieldDescriptor {
    pub fn begin(field_type: u8) -> Self {
        Self {
            boundary: FieldBoundary::Begin,
            value: field_type,
        }
    }

    pub fn separator() -> Self {
        Self {
            boundary: FieldBoundary::Separator,
            value: 0,
        }
    }

    pub fn end(flags: u8) -> Self {
        Self {
            boundary: FieldBoundary::End,
            value: flags,
        }
    }

    /// Decode the on-disk form: a mark byte then flt / grffld
    pub fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        let boundary = FieldBoundary::from_char(char::from(bytes[0] & 0x1F))?;
        Some(Self {
            boundary,
            value: bytes[1],
        })
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        let mark = match self.boundary {
            FieldBoundary::Begin => FIELD_BEGIN_MARK,
            FieldBoundary::Separator => FIELD_SEPARATOR_MARK,
            FieldBoundary::End => FIELD_END_MARK,
        };
        [mark as u8, self.value]
    }
}

/// One entry of a story's field plex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMarker {
    pub cp: usize,
    pub descriptor: FieldDescriptor,
}

impl FieldMarker {
    pub fn new(cp: usize, descriptor: FieldDescriptor) -> Self {
        Self { cp, descriptor }
    }

    pub fn boundary(&self) -> FieldBoundary {
        self.descriptor.boundary
    }
}

/// Derive a marker plex from raw story text. Positions are offset by `base`.
pub fn scan_field_markers(text: &str, base: usize) -> Vec<FieldMarker> {
    text.chars()
        .enumerate()
        .filter_map(|(i, ch)| {
            let descriptor = match FieldBoundary::from_char(ch)? {
                FieldBoundary::Begin => FieldDescriptor::begin(0),
                FieldBoundary::Separator => FieldDescriptor::separator(),
                FieldBoundary::End => FieldDescriptor::end(0),
            };
            Some(FieldMarker::new(base + i, descriptor))
        })
        .collect()
}

/// A parsed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    start: usize,
    separator: Option<usize>,
    end: usize,
    field_type: u8,
    flags: u8,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Field {
    /// Position of the begin mark
    pub fn start(&self) -> usize {
        self.start
    }

    /// Position of the separator mark, if the field has one
    pub fn separator(&self) -> Option<usize> {
        self.separator
    }

    /// Position of the end mark
    pub fn end(&self) -> usize {
        self.end
    }

    /// End of the field including its end mark
    pub fn end_exclusive(&self) -> usize {
        self.end + 1
    }

    pub fn has_separator(&self) -> bool {
        self.separator.is_some()
    }

    /// Field type (flt) from the begin mark
    pub fn field_type(&self) -> u8 {
        self.field_type
    }

    /// Flags (grffld) from the end mark
    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn is_locked(&self) -> bool {
        self.flags & FLD_LOCKED != 0
    }

    pub fn is_result_dirty(&self) -> bool {
        self.flags & FLD_RESULT_DIRTY != 0
    }

    pub fn is_result_edited(&self) -> bool {
        self.flags & FLD_RESULT_EDITED != 0
    }

    pub fn is_private_result(&self) -> bool {
        self.flags & FLD_PRIVATE_RESULT != 0
    }

    pub fn is_nested(&self) -> bool {
        self.parent.is_some() || self.flags & FLD_NESTED != 0
    }

    /// Field code span: after the begin mark up to the separator (or end)
    pub fn code_range(&self) -> (usize, usize) {
        (self.start + 1, self.separator.unwrap_or(self.end))
    }

    /// Result span: after the separator up to the end mark
    pub fn result_range(&self) -> Option<(usize, usize)> {
        self.separator.map(|sep| (sep + 1, self.end))
    }
}

/// The parsed fields of one story
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryFields {
    fields: Vec<Field>,
    roots: Vec<usize>,
    by_start: HashMap<usize, usize>,
}

impl StoryFields {
    /// Parse a story's marker plex. Markers need not be sorted. Dangling
    /// marks are skipped one at a time and parsing carries on.
    pub fn parse(mut markers: Vec<FieldMarker>) -> Self {
        markers.sort_by_key(|m| m.cp);
        let mut fields = Vec::new();
        let roots = parse_level(&markers, 0, markers.len(), None, &mut fields);
        let by_start = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.start, i))
            .collect();
        Self {
            fields,
            roots,
            by_start,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Top-level fields in document order
    pub fn roots(&self) -> impl Iterator<Item = &Field> {
        self.roots.iter().map(|&i| &self.fields[i])
    }

    /// Every field, nested ones included, ordered by start
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        let mut all: Vec<&Field> = self.fields.iter().collect();
        all.sort_by_key(|f| f.start);
        all.into_iter()
    }

    /// The field whose begin mark sits at `cp`
    pub fn by_start_offset(&self, cp: usize) -> Option<&Field> {
        self.by_start.get(&cp).map(|&i| &self.fields[i])
    }

    pub fn children<'a>(&'a self, field: &'a Field) -> impl Iterator<Item = &'a Field> + 'a {
        field.children.iter().map(|&i| &self.fields[i])
    }

    pub fn parent(&self, field: &Field) -> Option<&Field> {
        field.parent.map(|i| &self.fields[i])
    }
}

fn parse_level(
    markers: &[FieldMarker],
    from: usize,
    to: usize,
    parent: Option<usize>,
    out: &mut Vec<Field>,
) -> Vec<usize> {
    let mut level = Vec::new();
    let mut next = from;

    while next < to {
        let begin = markers[next];
        if begin.boundary() != FieldBoundary::Begin {
            tracing::warn!(cp = begin.cp, "field mark without a begin mark, skipping");
            next += 1;
            continue;
        }
        let Some((separator, end)) = match_field(markers, next, to) else {
            tracing::warn!(cp = begin.cp, "begin mark without a matching end mark, skipping");
            next += 1;
            continue;
        };

        let idx = out.len();
        out.push(Field {
            start: begin.cp,
            separator: separator.map(|s| markers[s].cp),
            end: markers[end].cp,
            field_type: begin.descriptor.value,
            flags: markers[end].descriptor.value,
            parent,
            children: Vec::new(),
        });

        let mut children = parse_level(markers, next + 1, separator.unwrap_or(end), Some(idx), out);
        if let Some(sep) = separator {
            children.extend(parse_level(markers, sep + 1, end, Some(idx), out));
        }
        out[idx].children = children;
        level.push(idx);
        next = end + 1;
    }
    level
}

/// Find the separator and end mark matching the begin mark at `begin`,
/// skipping over nested fields.
fn match_field(markers: &[FieldMarker], begin: usize, to: usize) -> Option<(Option<usize>, usize)> {
    let mut depth = 0usize;
    let mut separator = None;
    for (k, marker) in markers.iter().enumerate().take(to).skip(begin + 1) {
        match marker.boundary() {
            FieldBoundary::Begin => depth += 1,
            FieldBoundary::Separator if depth == 0 && separator.is_none() => separator = Some(k),
            FieldBoundary::Separator => {}
            FieldBoundary::End if depth == 0 => return Some((separator, k)),
            FieldBoundary::End => depth -= 1,
        }
    }
    None
}

/// Fields of every story in a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fields {
    stories: HashMap<Story, StoryFields>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the marker plex of each story
    pub fn from_markers(plexes: HashMap<Story, Vec<FieldMarker>>) -> Self {
        let stories = plexes
            .into_iter()
            .map(|(story, markers)| (story, StoryFields::parse(markers)))
            .collect();
        Self { stories }
    }

    pub fn set_story_markers(&mut self, story: Story, markers: Vec<FieldMarker>) {
        self.stories.insert(story, StoryFields::parse(markers));
    }

    pub fn story(&self, story: Story) -> Option<&StoryFields> {
        self.stories.get(&story)
    }

    /// Top-level fields of a story
    pub fn fields(&self, story: Story) -> impl Iterator<Item = &Field> {
        self.stories.get(&story).into_iter().flat_map(|s| s.roots())
    }

    pub fn field_by_start_offset(&self, story: Story, cp: usize) -> Option<&Field> {
        self.stories.get(&story)?.by_start_offset(cp)
    }
}

/// Remove field codes from text for display, keeping field results.
///
/// `begin code end` is removed entirely, `begin code sep result end` keeps
/// `result`. A nested field's text shows only when every enclosing field is
/// in its result part. Marks that don't balance leave the input unchanged.
pub fn strip_fields(text: &str) -> String {
    if !text.contains(FIELD_BEGIN_MARK) {
        return text.to_string();
    }

    // true once the open field has passed its separator
    let mut open: Vec<bool> = Vec::new();
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        match FieldBoundary::from_char(ch) {
            Some(FieldBoundary::Begin) => open.push(false),
            Some(FieldBoundary::Separator) => match open.last_mut() {
                Some(in_result) => *in_result = true,
                None => return text.to_string(),
            },
            Some(FieldBoundary::End) => {
                if open.pop().is_none() {
                    return text.to_string();
                }
            }
            None => {
                if open.iter().all(|&in_result| in_result) {
                    out.push(ch);
                }
            }
        }
    }

    if !open.is_empty() {
        return text.to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(marks: &[(usize, FieldBoundary)]) -> Vec<FieldMarker> {
        marks
            .iter()
            .map(|&(cp, boundary)| {
                let descriptor = match boundary {
                    FieldBoundary::Begin => FieldDescriptor::begin(88),
                    FieldBoundary::Separator => FieldDescriptor::separator(),
                    FieldBoundary::End => FieldDescriptor::end(FLD_HAS_SEP),
                };
                FieldMarker::new(cp, descriptor)
            })
            .collect()
    }

    use FieldBoundary::{Begin, End, Separator};

    #[test]
    fn test_nested_fields() {
        let parsed = StoryFields::parse(markers(&[
            (0, Begin),
            (5, Begin),
            (8, Separator),
            (10, End),
            (12, End),
        ]));
        assert_eq!(parsed.len(), 2);

        let roots: Vec<_> = parsed.roots().collect();
        assert_eq!(roots.len(), 1);
        let outer = roots[0];
        assert_eq!((outer.start(), outer.end()), (0, 12));
        assert!(!outer.has_separator());

        let inner: Vec<_> = parsed.children(outer).collect();
        assert_eq!(inner.len(), 1);
        assert_eq!((inner[0].start(), inner[0].end()), (5, 10));
        assert_eq!(inner[0].separator(), Some(8));
        assert!(inner[0].is_nested());
        assert_eq!(parsed.parent(inner[0]).unwrap().start(), 0);

        assert_eq!(parsed.by_start_offset(5).unwrap().end(), 10);
        assert!(parsed.by_start_offset(8).is_none());
    }

    #[test]
    fn test_unsorted_markers_and_ranges() {
        let parsed = StoryFields::parse(markers(&[
            (9, End),
            (0, Begin),
            (4, Separator),
        ]));
        let field = parsed.by_start_offset(0).unwrap();
        assert_eq!(field.code_range(), (1, 4));
        assert_eq!(field.result_range(), Some((5, 9)));
        assert_eq!(field.end_exclusive(), 10);
        assert_eq!(field.field_type(), 88);
    }

    #[test]
    fn test_dangling_markers_are_skipped() {
        // stray end, a begin that never closes, then a good field
        let parsed = StoryFields::parse(markers(&[
            (0, End),
            (2, Begin),
            (4, Begin),
            (6, Separator),
            (8, End),
        ]));
        assert_eq!(parsed.len(), 1);
        let field = parsed.roots().next().unwrap();
        assert_eq!((field.start(), field.end()), (4, 8));
    }

    #[test]
    fn test_scan_and_descriptor_bytes() {
        let text = "a\u{13}PAGE\u{14}3\u{15}";
        let scanned = scan_field_markers(text, 100);
        assert_eq!(scanned.len(), 3);
        assert_eq!(scanned[0].cp, 101);
        assert_eq!(scanned[1].cp, 106);
        assert_eq!(scanned[2].boundary(), End);

        let fld = FieldDescriptor::begin(33);
        assert_eq!(FieldDescriptor::from_bytes(fld.to_bytes()), Some(fld));
        assert_eq!(FieldDescriptor::from_bytes([0x41, 0]), None);
    }

    #[test]
    fn test_fields_by_story() {
        let mut plexes = HashMap::new();
        plexes.insert(Story::Main, markers(&[(3, Begin), (7, End)]));
        let mut fields = Fields::from_markers(plexes);
        fields.set_story_markers(Story::Footnote, markers(&[(40, Begin), (42, End)]));

        assert_eq!(fields.fields(Story::Main).count(), 1);
        assert!(fields.field_by_start_offset(Story::Main, 3).is_some());
        assert!(fields.field_by_start_offset(Story::Footnote, 40).is_some());
        assert_eq!(fields.fields(Story::Comment).count(), 0);
    }

    #[test]
    fn test_strip_fields_keeps_result() {
        assert_eq!(
            strip_fields("This is \u{13}Blah!\u{14}some\u{15} text."),
            "This is some text."
        );
    }

    #[test]
    fn test_strip_fields_without_separator() {
        assert_eq!(strip_fields("a\u{13}PAGE\u{15}b"), "ab");
        assert_eq!(strip_fields("no fields"), "no fields");
    }

    #[test]
    fn test_strip_nested_fields() {
        assert_eq!(
            strip_fields("x\u{13}IF \u{13}REF a\u{14}1\u{15}\u{14}yes\u{15}y"),
            "xyesy"
        );
        assert_eq!(strip_fields("a\u{13}X \u{13}Y\u{15}\u{15}b"), "ab");
        assert_eq!(
            strip_fields("\u{13}A\u{14}r1\u{15} \u{13}B\u{14}r2\u{15}"),
            "r1 r2"
        );
    }

    #[test]
    fn test_strip_unbalanced_leaves_input() {
        let broken = "oops \u{15} then \u{13}code";
        assert_eq!(strip_fields(broken), broken);
        let no_end = "a\u{13}b\u{14}c";
        assert_eq!(strip_fields(no_end), no_end);
    }
}

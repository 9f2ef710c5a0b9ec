//! Property nodes and the ordered tables (PLCs) that hold them
//!
//! A property table is an ordered list of `[start, end)` intervals over one
//! story's character positions. Within a table the nodes are sorted,
//! non-overlapping and contiguous: node `i` ends exactly where node `i + 1`
//! starts, the first node starts at 0 and the last one ends at the total
//! character count of the document.
//!
//! Every structural mutation bumps the table's generation so that cached index
//! windows held by range views can detect that they are out of date.

use crate::{DocModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The property tables a document carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Section properties (SEPX)
    Section,
    /// Paragraph properties (PAPX)
    Paragraph,
    /// Character run properties (CHPX)
    CharacterRun,
    /// Raw text pieces
    Text,
}

impl PropertyKind {
    /// All kinds, in the order edits are propagated after a text insertion
    pub const EDIT_ORDER: [PropertyKind; 4] = [
        PropertyKind::Text,
        PropertyKind::CharacterRun,
        PropertyKind::Paragraph,
        PropertyKind::Section,
    ];

    /// Dense index used for per-kind caches
    pub fn index(self) -> usize {
        match self {
            PropertyKind::Section => 0,
            PropertyKind::Paragraph => 1,
            PropertyKind::CharacterRun => 2,
            PropertyKind::Text => 3,
        }
    }
}

/// Hooks a payload gets when the span of its node is edited.
///
/// Property payloads (sprm buffers) don't care about their span, so the
/// defaults are no-ops. Text pieces override both to keep their characters in
/// step with the node's span.
pub trait NodePayload: Clone + fmt::Debug {
    /// Remove the node-relative span `[from, to)`.
    fn remove_span(&mut self, _from: usize, _to: usize) {}

    /// Split at node-relative offset `at`, keeping the head and returning the tail.
    fn split_off(&mut self, _at: usize) -> Self {
        self.clone()
    }
}

/// A single `[start, end)` interval carrying a payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyNode<T> {
    start: usize,
    end: usize,
    payload: T,
}

impl<T> PropertyNode<T> {
    /// Create a node. `start` must not exceed `end`.
    pub fn new(start: usize, end: usize, payload: T) -> Result<Self> {
        if end < start {
            return Err(DocModelError::InvalidRange { start, end });
        }
        Ok(Self {
            start,
            end,
            payload,
        })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    /// Whether this node overlaps the half-open window `[start, end)`
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && self.end > start
    }
}

/// An ordered, contiguous table of property nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyTable<T> {
    kind: PropertyKind,
    nodes: Vec<PropertyNode<T>>,
    #[serde(skip)]
    generation: u64,
}

impl<T: NodePayload> PropertyTable<T> {
    /// Create an empty table
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            generation: 0,
        }
    }

    /// Create a table from nodes, checking that they are contiguous from 0
    pub fn from_nodes(kind: PropertyKind, nodes: Vec<PropertyNode<T>>) -> Result<Self> {
        let table = Self {
            kind,
            nodes,
            generation: 0,
        };
        let total = table.total_length();
        table.check_coverage(total)?;
        Ok(table)
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bumped on every structural mutation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, index: usize) -> Option<&PropertyNode<T>> {
        self.nodes.get(index)
    }

    /// Get a node, failing if the index is out of bounds
    pub fn node(&self, index: usize) -> Result<&PropertyNode<T>> {
        self.nodes.get(index).ok_or(DocModelError::IndexOutOfBounds {
            kind: self.kind,
            index,
            len: self.nodes.len(),
        })
    }

    /// Mutable access to a node's payload. Spans are not editable from here,
    /// so this does not bump the generation.
    pub fn payload_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.nodes.len();
        let kind = self.kind;
        self.nodes
            .get_mut(index)
            .map(|node| &mut node.payload)
            .ok_or(DocModelError::IndexOutOfBounds { kind, index, len })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyNode<T>> {
        self.nodes.iter()
    }

    pub fn nodes(&self) -> &[PropertyNode<T>] {
        &self.nodes
    }

    /// End of the last node (0 for an empty table)
    pub fn total_length(&self) -> usize {
        self.nodes.last().map(|n| n.end).unwrap_or(0)
    }

    /// Find the half-open index window `[x, y)` of nodes overlapping
    /// `[start, end)`, scanning forward from `hint`.
    ///
    /// Ranges are mostly built in increasing offset order, so a linear scan
    /// from the previous position beats a binary search in practice. An empty
    /// window comes back as `(0, 0)` when nothing at or after `hint` starts
    /// before `end`.
    pub fn find_range(&self, hint: usize, start: usize, end: usize) -> (usize, usize) {
        let len = self.nodes.len();
        if hint >= len {
            return (len, len);
        }

        let mut x = hint;
        while self.nodes[x].end <= start && x < len - 1 {
            x += 1;
        }

        let node = &self.nodes[x];
        if node.start > end {
            return (0, 0);
        }
        if node.end <= start {
            return (len, len);
        }

        for y in x..len {
            let node = &self.nodes[y];
            if node.start < end && node.end <= end {
                continue;
            }
            if node.start < end {
                return (x, y + 1);
            }
            return (x, y);
        }
        (x, len)
    }

    /// Index of the node whose span contains `cp` (`start <= cp < end`)
    pub fn index_containing(&self, cp: usize) -> Option<usize> {
        let idx = self.nodes.partition_point(|n| n.end <= cp);
        (idx < self.nodes.len() && self.nodes[idx].start <= cp).then_some(idx)
    }

    /// Index of the node an insertion at `cp` attaches to when two nodes
    /// share the position: the lower-offset one.
    pub fn index_before(&self, cp: usize) -> Result<usize> {
        if self.nodes.is_empty() {
            return Err(DocModelError::EmptyTable { kind: self.kind });
        }
        let total = self.total_length();
        if cp > total {
            return Err(DocModelError::OffsetOutOfBounds {
                offset: cp,
                len: total,
            });
        }
        let idx = self.nodes.partition_point(|n| n.start < cp);
        Ok(idx.saturating_sub(1))
    }

    /// Index of the node that starts at or contains `cp`; the last node when
    /// `cp` is the end of the table.
    pub fn index_at_or_after(&self, cp: usize) -> Result<usize> {
        if self.nodes.is_empty() {
            return Err(DocModelError::EmptyTable { kind: self.kind });
        }
        let total = self.total_length();
        if cp > total {
            return Err(DocModelError::OffsetOutOfBounds {
                offset: cp,
                len: total,
            });
        }
        let idx = self.nodes.partition_point(|n| n.end <= cp);
        Ok(idx.min(self.nodes.len() - 1))
    }

    /// Grow node `index` by `length` at its end and shift every later node.
    pub fn adjust_for_insert(&mut self, index: usize, length: usize) -> Result<()> {
        self.node(index)?;
        self.nodes[index].end += length;
        for node in &mut self.nodes[index + 1..] {
            node.start += length;
            node.end += length;
        }
        self.generation += 1;
        Ok(())
    }

    /// Remove `[start, start + length)` from the table.
    ///
    /// Overlapping nodes are clipped, later nodes shift down and nodes that
    /// lie entirely inside the deleted span are dropped.
    pub fn adjust_for_delete(&mut self, start: usize, length: usize) -> Result<()> {
        let total = self.total_length();
        let end = start + length;
        if end > total {
            return Err(DocModelError::OffsetOutOfBounds {
                offset: end,
                len: total,
            });
        }
        if length == 0 {
            return Ok(());
        }

        let mut kept = Vec::with_capacity(self.nodes.len());
        for mut node in self.nodes.drain(..) {
            if node.end <= start && !(node.is_empty() && node.start == start) {
                kept.push(node);
                continue;
            }
            if node.start >= end {
                node.start -= length;
                node.end -= length;
                kept.push(node);
                continue;
            }
            if node.is_empty() {
                // a zero-length node strictly inside the deleted span
                node.start = start;
                node.end = start;
                kept.push(node);
                continue;
            }

            let consumed = node.start >= start && node.end <= end;
            let from = start.max(node.start) - node.start;
            let to = end.min(node.end) - node.start;
            node.payload.remove_span(from, to);
            if consumed {
                continue;
            }
            node.end = if end >= node.end { start } else { node.end - length };
            node.start = node.start.min(start);
            kept.push(node);
        }
        self.nodes = kept;
        self.generation += 1;
        Ok(())
    }

    /// Splice a zero-length node carrying `payload` at `cp`, anchored at
    /// node `index`.
    ///
    /// The anchor must start at, contain, or end at `cp`. When `cp` lies
    /// strictly inside the anchor it is split in two around the new node.
    /// Returns the index of the new node, ready for [`adjust_for_insert`].
    ///
    /// [`adjust_for_insert`]: PropertyTable::adjust_for_insert
    pub fn insert_node(&mut self, index: usize, cp: usize, payload: T) -> Result<usize> {
        let spliced = PropertyNode {
            start: cp,
            end: cp,
            payload,
        };

        if index == self.nodes.len() && cp == self.total_length() {
            self.nodes.push(spliced);
            self.generation += 1;
            return Ok(index);
        }

        let (anchor_start, anchor_end) = {
            let anchor = self.node(index)?;
            (anchor.start, anchor.end)
        };

        let at = if cp == anchor_start {
            index
        } else if cp == anchor_end {
            index + 1
        } else if anchor_start < cp && cp < anchor_end {
            let anchor = &mut self.nodes[index];
            let tail_payload = anchor.payload.split_off(cp - anchor_start);
            anchor.end = cp;
            let tail = PropertyNode {
                start: cp,
                end: anchor_end,
                payload: tail_payload,
            };
            self.nodes.insert(index + 1, tail);
            index + 1
        } else {
            return Err(DocModelError::OffsetOutOfBounds {
                offset: cp,
                len: anchor_end,
            });
        };

        self.nodes.insert(at, spliced);
        self.generation += 1;
        Ok(at)
    }

    /// Verify the coverage invariant against the expected total length.
    pub fn check_coverage(&self, total: usize) -> Result<()> {
        let violation = |detail: String| DocModelError::CoverageViolation {
            kind: self.kind,
            detail,
        };

        let Some(first) = self.nodes.first() else {
            return if total == 0 {
                Ok(())
            } else {
                Err(violation(format!("no nodes but expected length {}", total)))
            };
        };
        if first.start != 0 {
            return Err(violation(format!("first node starts at {}", first.start)));
        }
        for (i, pair) in self.nodes.windows(2).enumerate() {
            if pair[0].end < pair[0].start {
                return Err(violation(format!("node {} ends before it starts", i)));
            }
            if pair[0].end != pair[1].start {
                return Err(violation(format!(
                    "node {} ends at {} but node {} starts at {}",
                    i,
                    pair[0].end,
                    i + 1,
                    pair[1].start
                )));
            }
        }
        let last = self.total_length();
        if last != total {
            return Err(violation(format!(
                "last node ends at {} but expected {}",
                last, total
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tag(u8);

    impl NodePayload for Tag {}

    fn table(bounds: &[(usize, usize)]) -> PropertyTable<Tag> {
        let nodes = bounds
            .iter()
            .enumerate()
            .map(|(i, &(s, e))| PropertyNode::new(s, e, Tag(i as u8)).unwrap())
            .collect();
        PropertyTable::from_nodes(PropertyKind::Paragraph, nodes).unwrap()
    }

    fn spans(table: &PropertyTable<Tag>) -> Vec<(usize, usize)> {
        table.iter().map(|n| (n.start(), n.end())).collect()
    }

    #[test]
    fn test_from_nodes_rejects_gaps() {
        let nodes = vec![
            PropertyNode::new(0, 5, Tag(0)).unwrap(),
            PropertyNode::new(6, 9, Tag(1)).unwrap(),
        ];
        assert!(matches!(
            PropertyTable::from_nodes(PropertyKind::Text, nodes),
            Err(DocModelError::CoverageViolation { .. })
        ));
        assert!(PropertyNode::new(4, 2, Tag(0)).is_err());
    }

    #[test]
    fn test_find_range() {
        let t = table(&[(0, 5), (5, 10), (10, 20)]);
        assert_eq!(t.find_range(0, 0, 20), (0, 3));
        assert_eq!(t.find_range(0, 5, 10), (1, 2));
        assert_eq!(t.find_range(0, 3, 12), (0, 3));
        assert_eq!(t.find_range(1, 6, 7), (1, 2));
        // zero-length window at a node boundary resolves to nothing
        assert_eq!(t.find_range(0, 5, 5), (1, 1));
        // hint past the end
        assert_eq!(t.find_range(3, 0, 5), (3, 3));
    }

    #[test]
    fn test_adjust_for_insert() {
        let mut t = table(&[(0, 5), (5, 10), (10, 20)]);
        let generation = t.generation();
        t.adjust_for_insert(1, 3).unwrap();
        assert_eq!(spans(&t), vec![(0, 5), (5, 13), (13, 23)]);
        assert!(t.generation() > generation);
        assert!(t.adjust_for_insert(3, 1).is_err());
    }

    #[test]
    fn test_adjust_for_delete_clips_and_removes() {
        let mut t = table(&[(0, 5), (5, 10), (10, 20)]);
        t.adjust_for_delete(3, 9).unwrap();
        // middle node fully consumed, neighbours clipped
        assert_eq!(spans(&t), vec![(0, 3), (3, 11)]);
        assert_eq!(t.get(1).unwrap().payload(), &Tag(2));
        t.check_coverage(11).unwrap();
    }

    #[test]
    fn test_adjust_for_delete_inside_one_node() {
        let mut t = table(&[(0, 5), (5, 10)]);
        t.adjust_for_delete(6, 2).unwrap();
        assert_eq!(spans(&t), vec![(0, 5), (5, 8)]);
        assert!(t.adjust_for_delete(7, 5).is_err());
    }

    #[test]
    fn test_insert_node_splits_anchor() {
        let mut t = table(&[(0, 5), (5, 10)]);
        let idx = t.insert_node(1, 7, Tag(9)).unwrap();
        assert_eq!(idx, 2);
        assert_eq!(spans(&t), vec![(0, 5), (5, 7), (7, 7), (7, 10)]);
        t.adjust_for_insert(idx, 4).unwrap();
        assert_eq!(spans(&t), vec![(0, 5), (5, 7), (7, 11), (11, 14)]);
        t.check_coverage(14).unwrap();
    }

    #[test]
    fn test_insert_node_at_boundaries() {
        let mut t = table(&[(0, 5), (5, 10)]);
        assert_eq!(t.insert_node(1, 5, Tag(7)).unwrap(), 1);
        assert_eq!(t.insert_node(0, 5, Tag(8)).unwrap(), 1);
        assert_eq!(t.insert_node(4, 10, Tag(9)).unwrap(), 4);
        assert_eq!(
            spans(&t),
            vec![(0, 5), (5, 5), (5, 5), (5, 10), (10, 10)]
        );
        assert!(t.insert_node(0, 8, Tag(1)).is_err());
    }

    #[test]
    fn test_anchor_lookup() {
        let t = table(&[(0, 5), (5, 10)]);
        assert_eq!(t.index_containing(5), Some(1));
        assert_eq!(t.index_containing(10), None);
        assert_eq!(t.index_before(5).unwrap(), 0);
        assert_eq!(t.index_before(0).unwrap(), 0);
        assert_eq!(t.index_at_or_after(5).unwrap(), 1);
        assert_eq!(t.index_at_or_after(10).unwrap(), 1);
        assert!(t.index_before(11).is_err());
    }

    fn lengths_to_table(lengths: &[usize]) -> PropertyTable<Tag> {
        let mut bounds = Vec::new();
        let mut cp = 0;
        for len in lengths {
            bounds.push((cp, cp + len));
            cp += len;
        }
        table(&bounds)
    }

    proptest! {
        #[test]
        fn test_find_range_matches_overlap(
            lengths in prop::collection::vec(1usize..10, 1..8),
            a in any::<usize>(),
            b in any::<usize>(),
        ) {
            let t = lengths_to_table(&lengths);
            let total = t.total_length();
            let start = a % total;
            let end = start + 1 + b % (total - start);
            let (x, y) = t.find_range(0, start, end);
            let expected: Vec<usize> = t
                .iter()
                .enumerate()
                .filter(|(_, n)| n.overlaps(start, end))
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!((x..y).collect::<Vec<_>>(), expected);
        }

        #[test]
        fn test_edits_keep_coverage(
            lengths in prop::collection::vec(1usize..10, 1..8),
            edits in prop::collection::vec((any::<bool>(), any::<usize>(), 1usize..6), 1..10),
        ) {
            let mut t = lengths_to_table(&lengths);
            for (insert, at, len) in edits {
                let total = t.total_length();
                if insert {
                    let index = at % t.len();
                    t.adjust_for_insert(index, len).unwrap();
                    prop_assert_eq!(t.total_length(), total + len);
                } else if total > 1 {
                    let start = at % (total - 1);
                    let len = len.min(total - 1 - start);
                    t.adjust_for_delete(start, len).unwrap();
                    prop_assert_eq!(t.total_length(), total - len);
                }
                prop_assert!(t.check_coverage(t.total_length()).is_ok());
                prop_assert!(!t.is_empty());
            }
        }
    }
}

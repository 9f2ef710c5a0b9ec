//! Stories and their aggregate length counters
//!
//! The character-position space is the concatenation of every story in file
//! order. Each story's length lives in a counter that edits keep up to date.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A top-level subdivision of the character-position space, in file order
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Story {
    #[default]
    Main,
    Footnote,
    Header,
    Macro,
    Comment,
    Endnote,
    Textbox,
    HeaderTextbox,
}

impl Story {
    /// Every story in file order
    pub const ORDERED: [Story; 8] = [
        Story::Main,
        Story::Footnote,
        Story::Header,
        Story::Macro,
        Story::Comment,
        Story::Endnote,
        Story::Textbox,
        Story::HeaderTextbox,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-story character counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryLengths {
    lengths: [usize; 8],
}

impl StoryLengths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(&self, story: Story) -> usize {
        self.lengths[story.index()]
    }

    pub fn set_length(&mut self, story: Story, length: usize) {
        self.lengths[story.index()] = length;
    }

    /// Sum of every story
    pub fn total(&self) -> usize {
        self.lengths.iter().sum()
    }

    /// Character positions covered by `story`
    pub fn range(&self, story: Story) -> Range<usize> {
        let start: usize = self.lengths[..story.index()].iter().sum();
        start..start + self.length(story)
    }

    /// The story an edit at `cp` belongs to: the first whose cumulative end
    /// is not before `cp`. A position on a boundary belongs to the earlier story.
    pub fn story_at(&self, cp: usize) -> Option<Story> {
        let mut end = 0;
        for story in Story::ORDERED {
            end += self.length(story);
            if cp <= end {
                return Some(story);
            }
        }
        None
    }

    /// The story holding the character at `cp`. Empty stories hold nothing,
    /// so a boundary position belongs to the later, non-empty story.
    pub fn story_containing(&self, cp: usize) -> Option<Story> {
        let mut end = 0;
        for story in Story::ORDERED {
            end += self.length(story);
            if cp < end {
                return Some(story);
            }
        }
        None
    }

    /// Apply a length change caused by an edit at `cp`. Returns the story that
    /// absorbed it, or `None` when `cp` lies beyond every story.
    pub fn adjust(&mut self, cp: usize, delta: isize) -> Option<Story> {
        let story = self.story_at(cp)?;
        self.resize(story, delta);
        Some(story)
    }

    /// Grow or shrink one story's counter
    pub fn resize(&mut self, story: Story, delta: isize) {
        let length = &mut self.lengths[story.index()];
        *length = length.saturating_add_signed(delta);
    }

    /// Remove `[start, start + length)`, charging each story for the part of
    /// the span it holds
    pub fn remove(&mut self, start: usize, length: usize) {
        let end = start + length;
        let mut story_start = 0;
        for story in Story::ORDERED {
            let story_end = story_start + self.length(story);
            let overlap = end.min(story_end).saturating_sub(start.max(story_start));
            self.lengths[story.index()] -= overlap;
            story_start = story_end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lengths() -> StoryLengths {
        let mut l = StoryLengths::new();
        l.set_length(Story::Main, 100);
        l.set_length(Story::Footnote, 20);
        l.set_length(Story::Comment, 10);
        l
    }

    #[test]
    fn test_ranges_follow_file_order() {
        let l = lengths();
        assert_eq!(l.range(Story::Main), 0..100);
        assert_eq!(l.range(Story::Footnote), 100..120);
        assert_eq!(l.range(Story::Header), 120..120);
        assert_eq!(l.range(Story::Comment), 120..130);
        assert_eq!(l.total(), 130);
    }

    #[test]
    fn test_adjust_picks_owning_story() {
        let mut l = lengths();
        assert_eq!(l.adjust(50, 5), Some(Story::Main));
        assert_eq!(l.length(Story::Main), 105);
        // boundary belongs to the earlier story
        assert_eq!(l.adjust(105, 1), Some(Story::Main));
        assert_eq!(l.adjust(110, -3), Some(Story::Footnote));
        assert_eq!(l.length(Story::Footnote), 17);
        assert_eq!(l.adjust(125, -2), Some(Story::Comment));
        assert_eq!(l.length(Story::Comment), 8);
        assert_eq!(l.adjust(1000, 1), None);
    }

    #[test]
    fn test_story_containing_is_half_open() {
        let mut l = lengths();
        assert_eq!(l.story_containing(0), Some(Story::Main));
        assert_eq!(l.story_containing(99), Some(Story::Main));
        // the header is empty, so 120 starts the comment story
        assert_eq!(l.story_containing(100), Some(Story::Footnote));
        assert_eq!(l.story_containing(120), Some(Story::Comment));
        assert_eq!(l.story_containing(130), None);

        l.resize(Story::Footnote, 2);
        assert_eq!(l.range(Story::Footnote), 100..122);
        l.resize(Story::Footnote, -30);
        assert_eq!(l.length(Story::Footnote), 0);
    }

    #[test]
    fn test_remove_spans_stories() {
        let mut l = lengths();
        // a deletion starting on the main/footnote boundary belongs to the footnote
        l.remove(100, 5);
        assert_eq!(l.length(Story::Main), 100);
        assert_eq!(l.length(Story::Footnote), 15);

        l.remove(95, 10);
        assert_eq!(l.length(Story::Main), 95);
        assert_eq!(l.length(Story::Footnote), 10);
        assert_eq!(l.total(), 115);
    }
}

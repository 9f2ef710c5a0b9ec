//! Bookmarks - named spans stored as paired first / last descriptors
//!
//! The first descriptor records where a bookmark starts and which last
//! descriptor closes it; the last descriptor records where it ends; names
//! live in a third parallel table. Many bookmarks may start at the same
//! position, so lookups go through a start-offset index.

use crate::{DocModelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum bookmark name length
pub const MAX_BOOKMARK_NAME_LENGTH: usize = 40;

/// Reasons a bookmark name is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookmarkNameError {
    #[error("Bookmark name cannot be empty")]
    EmptyName,
    #[error("Bookmark name can only contain letters, numbers, and underscores")]
    InvalidCharacters,
    #[error("Bookmark name must start with a letter")]
    MustStartWithLetter,
    #[error("Bookmark name cannot exceed 40 characters")]
    NameTooLong,
}

/// Validate a bookmark name
pub fn validate_bookmark_name(name: &str) -> std::result::Result<(), BookmarkNameError> {
    let Some(first) = name.chars().next() else {
        return Err(BookmarkNameError::EmptyName);
    };
    if name.chars().count() > MAX_BOOKMARK_NAME_LENGTH {
        return Err(BookmarkNameError::NameTooLong);
    }
    if !first.is_alphabetic() {
        return Err(BookmarkNameError::MustStartWithLetter);
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(BookmarkNameError::InvalidCharacters);
    }
    Ok(())
}

/// A bookmark's first descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkFirst {
    pub start: usize,
    /// End of the descriptor's own plex node
    pub end: usize,
    /// Index of the paired last descriptor
    pub last: Option<usize>,
}

/// A resolved bookmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub index: usize,
    pub name: String,
    pub start: usize,
    pub end: usize,
}

/// Bookmarks of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmarks {
    firsts: Vec<BookmarkFirst>,
    /// End positions of last descriptors
    lasts: Vec<usize>,
    names: Vec<String>,
    /// start -> bookmark indices, ordered by end
    by_start: HashMap<usize, Vec<usize>>,
    /// Distinct starts, ascending
    starts: Vec<usize>,
}

impl Bookmarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the three descriptor tables as found in a file
    pub fn from_descriptors(
        firsts: Vec<BookmarkFirst>,
        lasts: Vec<usize>,
        names: Vec<String>,
    ) -> Self {
        let mut bookmarks = Self {
            firsts,
            lasts,
            names,
            ..Default::default()
        };
        bookmarks.reindex();
        bookmarks
    }

    /// Add a bookmark spanning `[start, end)`; returns its index
    pub fn add(&mut self, name: &str, start: usize, end: usize) -> Result<usize> {
        if end < start {
            return Err(DocModelError::InvalidRange { start, end });
        }
        validate_bookmark_name(name)?;
        self.lasts.push(end);
        self.firsts.push(BookmarkFirst {
            start,
            end: start,
            last: Some(self.lasts.len() - 1),
        });
        self.names.push(name.to_string());
        self.reindex();
        Ok(self.firsts.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.firsts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.firsts.is_empty()
    }

    /// Bookmark by index. A missing last descriptor resolves the end to the
    /// first descriptor's own end; a missing name resolves to "".
    ///
    /// A first descriptor pairs with the last descriptor at its own index
    /// unless it names another one through [`BookmarkFirst::last`].
    pub fn bookmark(&self, index: usize) -> Result<Bookmark> {
        let first = self
            .firsts
            .get(index)
            .ok_or(DocModelError::BookmarkOutOfBounds {
                index,
                len: self.firsts.len(),
            })?;
        let end = match self.last_index(index) {
            Some(last) => self.lasts[last],
            None => {
                tracing::warn!(index, "bookmark has no last descriptor");
                first.end
            }
        };
        let name = self.names.get(index).cloned().unwrap_or_default();
        Ok(Bookmark {
            index,
            name,
            start: first.start,
            end,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Bookmark> + '_ {
        (0..self.len()).filter_map(|i| self.bookmark(i).ok())
    }

    /// Every bookmark starting exactly at `start`, ordered by end
    pub fn bookmarks_at(&self, start: usize) -> Vec<Bookmark> {
        self.by_start
            .get(&start)
            .map(|indices| self.resolve(indices))
            .unwrap_or_default()
    }

    /// Bookmarks starting in `[from, to)`, grouped by start in ascending order
    pub fn bookmarks_started_between(&self, from: usize, to: usize) -> Vec<(usize, Vec<Bookmark>)> {
        let lo = self.starts.partition_point(|&s| s < from);
        let hi = self.starts.partition_point(|&s| s < to);
        self.starts[lo..hi.max(lo)]
            .iter()
            .map(|&start| (start, self.bookmarks_at(start)))
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<Bookmark> {
        let index = self.names.iter().position(|n| n == name)?;
        self.bookmark(index).ok()
    }

    pub fn set_name(&mut self, index: usize, name: &str) -> Result<()> {
        validate_bookmark_name(name)?;
        if index >= self.firsts.len() {
            return Err(DocModelError::BookmarkOutOfBounds {
                index,
                len: self.firsts.len(),
            });
        }
        if self.names.len() <= index {
            self.names.resize(index + 1, String::new());
        }
        self.names[index] = name.to_string();
        Ok(())
    }

    /// Remove a bookmark with its last descriptor and name
    pub fn remove(&mut self, index: usize) -> Result<Bookmark> {
        let removed = self.bookmark(index)?;
        let paired = self.last_index(index);
        self.firsts.remove(index);
        if index < self.names.len() {
            self.names.remove(index);
        }
        if let Some(last) = paired {
            self.lasts.remove(last);
            for other in &mut self.firsts {
                if let Some(l) = other.last.as_mut() {
                    if *l > last {
                        *l -= 1;
                    }
                }
            }
        }
        self.reindex();
        Ok(removed)
    }

    /// Shift positions for `length` characters inserted at `cp`. A bookmark
    /// starting at `cp` grows to cover the new text.
    pub fn after_insert(&mut self, cp: usize, length: usize) {
        for first in &mut self.firsts {
            if first.start > cp {
                first.start += length;
            }
            if first.end > cp {
                first.end += length;
            }
        }
        for end in &mut self.lasts {
            if *end >= cp {
                *end += length;
            }
        }
        self.reindex();
    }

    /// Shift and clip positions for `length` characters deleted at `start`
    pub fn after_delete(&mut self, start: usize, length: usize) {
        let map = |cp: usize| {
            if cp <= start {
                cp
            } else if cp >= start + length {
                cp - length
            } else {
                start
            }
        };
        for first in &mut self.firsts {
            first.start = map(first.start);
            first.end = map(first.end);
        }
        for end in &mut self.lasts {
            *end = map(*end);
        }
        self.reindex();
    }

    fn resolve(&self, indices: &[usize]) -> Vec<Bookmark> {
        indices.iter().filter_map(|&i| self.bookmark(i).ok()).collect()
    }

    /// Last descriptor paired with first descriptor `index`
    fn last_index(&self, index: usize) -> Option<usize> {
        let last = self.firsts.get(index)?.last.unwrap_or(index);
        (last < self.lasts.len()).then_some(last)
    }

    fn end_of(&self, index: usize) -> usize {
        match self.last_index(index) {
            Some(last) => self.lasts[last],
            None => self.firsts[index].end,
        }
    }

    fn reindex(&mut self) {
        let mut by_start: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, first) in self.firsts.iter().enumerate() {
            by_start.entry(first.start).or_default().push(i);
        }
        for indices in by_start.values_mut() {
            indices.sort_by_key(|&i| (self.end_of(i), i));
        }
        let mut starts: Vec<usize> = by_start.keys().copied().collect();
        starts.sort_unstable();
        self.by_start = by_start;
        self.starts = starts;
    }
}

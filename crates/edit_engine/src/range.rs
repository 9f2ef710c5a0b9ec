//! Range handles and the arena that stores range views
//!
//! A range is a `[start, end)` span over the document's character positions,
//! optionally nested in a parent range. Views live in an arena owned by the
//! editor and are addressed by copyable [`RangeId`] handles, so a child can
//! reach its ancestors to repair their spans after an edit.
//!
//! Each view caches, per property kind, the window of table indices it
//! overlaps. A window is stamped with the generation of the table it was
//! resolved against and goes stale when that table changes structurally.
//!
//! Typed views (paragraphs, runs, table parts, ...) are shared: asking for the
//! same node of the same parent again hands back the view created the first
//! time, as long as its span is unchanged.

use crate::{EditError, Result};
use doc_model::{PropertyKind, Story};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::HashMap;

/// Handle to a range view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeId {
    index: u32,
    generation: u32,
}

/// What a range view was created as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeKind {
    /// The whole document
    Overall,
    /// One story
    Story(Story),
    /// Arbitrary span
    Span,
    Section,
    Paragraph,
    CharacterRun,
    Table,
    TableRow,
    TableCell,
    ListEntry,
    /// One text piece
    TextPiece,
}

/// Cached index window into one property table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Window {
    pub start: usize,
    pub end: usize,
    pub generation: u64,
    pub resolved: bool,
}

impl Window {
    pub fn is_fresh(&self, generation: u64) -> bool {
        self.resolved && self.generation == generation
    }
}

#[derive(Debug)]
pub(crate) struct View {
    pub start: usize,
    pub end: usize,
    pub parent: Option<RangeId>,
    pub kind: RangeKind,
    /// Indexed by `PropertyKind::index`
    pub windows: Cell<[Window; 4]>,
}

impl View {
    pub fn new(start: usize, end: usize, parent: Option<RangeId>, kind: RangeKind) -> Self {
        Self {
            start,
            end,
            parent,
            kind,
            windows: Cell::new([Window::default(); 4]),
        }
    }

    pub fn window(&self, kind: PropertyKind) -> Window {
        self.windows.get()[kind.index()]
    }

    pub fn set_window(&self, kind: PropertyKind, window: Window) {
        let mut windows = self.windows.get();
        windows[kind.index()] = window;
        self.windows.set(windows);
    }

    pub fn clear_windows(&self) {
        self.windows.set([Window::default(); 4]);
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    view: Option<View>,
}

/// Parent, kind and span of a shared view
type ShareKey = (RangeId, RangeKind, usize, usize);

/// Generational arena of range views
#[derive(Debug, Default)]
pub(crate) struct RangeArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    shared: HashMap<ShareKey, RangeId>,
}

impl RangeArena {
    /// Insert a typed child view, or return the live view already standing
    /// for the same parent, kind and span
    pub fn insert_shared(&mut self, view: View) -> RangeId {
        let Some(parent) = view.parent else {
            return self.insert(view);
        };
        let key = (parent, view.kind, view.start, view.end);
        if let Some(&id) = self.shared.get(&key) {
            if self.get(id).is_ok_and(|v| Self::key_of(v) == Some(key)) {
                return id;
            }
        }
        let id = self.insert(view);
        self.shared.insert(key, id);
        id
    }

    fn key_of(view: &View) -> Option<ShareKey> {
        view.parent
            .map(|parent| (parent, view.kind, view.start, view.end))
    }

    pub fn insert(&mut self, view: View) -> RangeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.view = Some(view);
            return RangeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            view: Some(view),
        });
        RangeId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    pub fn get(&self, id: RangeId) -> Result<&View> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.view.as_ref())
            .ok_or(EditError::UnknownRange(id))
    }

    pub fn get_mut(&mut self, id: RangeId) -> Result<&mut View> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.view.as_mut())
            .ok_or(EditError::UnknownRange(id))
    }

    pub fn remove(&mut self, id: RangeId) -> Result<View> {
        self.get(id)?;
        let slot = &mut self.slots[id.index as usize];
        let view = slot.view.take().ok_or(EditError::UnknownRange(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        if let Some(key) = Self::key_of(&view) {
            if self.shared.get(&key) == Some(&id) {
                self.shared.remove(&key);
            }
        }
        Ok(view)
    }

    /// Parent chain of `id`, nearest first. Released ancestors end the chain.
    pub fn ancestors(&self, id: RangeId) -> Vec<RangeId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).ok().and_then(|v| v.parent);
        while let Some(parent) = current {
            let Ok(view) = self.get(parent) else {
                break;
            };
            chain.push(parent);
            current = view.parent;
        }
        chain
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

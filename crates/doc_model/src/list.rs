//! List tables - list definitions (LST) and format overrides (LFO)
//!
//! A paragraph joins a list through its `ilfo` (1-based index of a format
//! override) and `ilvl` (level 0-8). The override names the list definition
//! by its `lsid`; the definition holds the per-level numbering data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of levels in a list definition
pub const MAX_LIST_LEVELS: usize = 9;

/// Number format of a list level (nfc)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NumberFormat {
    #[default]
    Decimal,
    UpperRoman,
    LowerRoman,
    UpperLetter,
    LowerLetter,
    Ordinal,
    Bullet,
    None,
    Other(u8),
}

impl NumberFormat {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => NumberFormat::Decimal,
            1 => NumberFormat::UpperRoman,
            2 => NumberFormat::LowerRoman,
            3 => NumberFormat::UpperLetter,
            4 => NumberFormat::LowerLetter,
            5 => NumberFormat::Ordinal,
            23 => NumberFormat::Bullet,
            255 => NumberFormat::None,
            other => NumberFormat::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            NumberFormat::Decimal => 0,
            NumberFormat::UpperRoman => 1,
            NumberFormat::LowerRoman => 2,
            NumberFormat::UpperLetter => 3,
            NumberFormat::LowerLetter => 4,
            NumberFormat::Ordinal => 5,
            NumberFormat::Bullet => 23,
            NumberFormat::None => 255,
            NumberFormat::Other(code) => code,
        }
    }
}

/// One level of a list definition (LVL)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListLevel {
    pub start_at: u32,
    pub number_format: NumberFormat,
    /// Number text template; level placeholders are the characters 0-8
    pub number_text: String,
    /// Restart numbering after a higher level
    pub restart_after_higher: bool,
}

impl ListLevel {
    pub fn new(number_format: NumberFormat, number_text: impl Into<String>) -> Self {
        Self {
            start_at: 1,
            number_format,
            number_text: number_text.into(),
            restart_after_higher: true,
        }
    }
}

/// A list definition (LSTF + its levels)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListData {
    pub lsid: i32,
    /// Simple lists have one level
    pub simple: bool,
    pub levels: Vec<ListLevel>,
}

impl ListData {
    /// A multi-level decimal list ("1.", "1.1.", ...)
    pub fn numbered(lsid: i32) -> Self {
        let levels = (0..MAX_LIST_LEVELS)
            .map(|lvl| {
                let text: String = (0..=lvl)
                    .map(|l| format!("{}.", char::from(l as u8)))
                    .collect();
                ListLevel::new(NumberFormat::Decimal, text)
            })
            .collect();
        Self {
            lsid,
            simple: false,
            levels,
        }
    }

    /// A single-level bullet list
    pub fn bulleted(lsid: i32) -> Self {
        Self {
            lsid,
            simple: true,
            levels: vec![ListLevel::new(NumberFormat::Bullet, "\u{2022}")],
        }
    }

    pub fn level(&self, ilvl: u8) -> Option<&ListLevel> {
        self.levels.get(ilvl as usize)
    }
}

/// A list format override (LFO)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFormatOverride {
    pub lsid: i32,
    /// Per-level start-at overrides
    pub start_overrides: HashMap<u8, u32>,
}

impl ListFormatOverride {
    pub fn new(lsid: i32) -> Self {
        Self {
            lsid,
            start_overrides: HashMap::new(),
        }
    }
}

/// All list definitions and overrides of a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTables {
    lists: HashMap<i32, ListData>,
    overrides: Vec<ListFormatOverride>,
}

impl ListTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a list with a fresh override; returns the override's ilfo
    pub fn add_list(&mut self, list: ListData) -> u16 {
        let lsid = list.lsid;
        self.lists.insert(lsid, list);
        self.add_override(ListFormatOverride::new(lsid))
    }

    /// Register an override; returns its 1-based ilfo
    pub fn add_override(&mut self, lfo: ListFormatOverride) -> u16 {
        self.overrides.push(lfo);
        self.overrides.len() as u16
    }

    pub fn list(&self, lsid: i32) -> Option<&ListData> {
        self.lists.get(&lsid)
    }

    /// Override for a 1-based ilfo; `None` for 0 or unknown indices
    pub fn format_override(&self, ilfo: u16) -> Option<&ListFormatOverride> {
        (ilfo as usize)
            .checked_sub(1)
            .and_then(|idx| self.overrides.get(idx))
    }

    /// Resolve a paragraph's `(ilfo, ilvl)` to its list level, applying any
    /// start-at override
    pub fn level(&self, ilfo: u16, ilvl: u8) -> Option<ListLevel> {
        let lfo = self.format_override(ilfo)?;
        let mut level = self.list(lfo.lsid)?.level(ilvl)?.clone();
        if let Some(&start) = lfo.start_overrides.get(&ilvl) {
            level.start_at = start;
        }
        Some(level)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_list_and_resolve_level() {
        let mut tables = ListTables::new();
        let ilfo = tables.add_list(ListData::numbered(42));
        assert_eq!(ilfo, 1);

        let level = tables.level(ilfo, 1).unwrap();
        assert_eq!(level.number_format, NumberFormat::Decimal);
        assert_eq!(level.number_text, "\u{0}.\u{1}.");
        assert_eq!(level.start_at, 1);
    }

    #[test]
    fn test_start_override() {
        let mut tables = ListTables::new();
        tables.add_list(ListData::bulleted(7));
        let mut lfo = ListFormatOverride::new(7);
        lfo.start_overrides.insert(0, 5);
        let ilfo = tables.add_override(lfo);
        assert_eq!(ilfo, 2);
        assert_eq!(tables.level(ilfo, 0).unwrap().start_at, 5);
    }

    #[test]
    fn test_missing_data_resolves_to_none() {
        let mut tables = ListTables::new();
        assert!(tables.level(0, 0).is_none());
        assert!(tables.level(3, 0).is_none());
        let ilfo = tables.add_override(ListFormatOverride::new(99));
        assert!(tables.level(ilfo, 0).is_none());
        let ilfo = tables.add_list(ListData::bulleted(1));
        assert!(tables.level(ilfo, 4).is_none());
    }

    #[test]
    fn test_number_format_codes() {
        assert_eq!(NumberFormat::from_code(23), NumberFormat::Bullet);
        assert_eq!(NumberFormat::from_code(60).code(), 60);
    }
}

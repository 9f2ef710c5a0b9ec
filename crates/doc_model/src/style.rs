//! Style sheet - base properties that paragraph and character sprms apply to
//!
//! Styles are addressed by index (istd). Each entry already carries fully
//! resolved paragraph and character properties; following `based_on` chains
//! is the job of whoever loads the style sheet.

use crate::{CharacterProperties, ParagraphProperties};
use serde::{Deserialize, Serialize};

/// Style index meaning "no style"
pub const NIL_STYLE: u16 = 4095;

/// The type of style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

/// One style sheet entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDescription {
    pub name: String,
    pub style_type: StyleType,
    pub based_on: Option<u16>,
    pub paragraph: ParagraphProperties,
    pub character: CharacterProperties,
}

impl StyleDescription {
    pub fn paragraph(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style_type: StyleType::Paragraph,
            based_on: None,
            paragraph: ParagraphProperties::default(),
            character: CharacterProperties::default(),
        }
    }

    pub fn with_paragraph_properties(mut self, props: ParagraphProperties) -> Self {
        self.paragraph = props;
        self
    }

    pub fn with_character_properties(mut self, props: CharacterProperties) -> Self {
        self.character = props;
        self
    }
}

/// Indexed style sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    styles: Vec<Option<StyleDescription>>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            styles: vec![Some(StyleDescription::paragraph("Normal"))],
        }
    }
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a style at `istd`, growing the sheet with empty slots as needed
    pub fn set_style(&mut self, istd: u16, style: StyleDescription) {
        let idx = istd as usize;
        if self.styles.len() <= idx {
            self.styles.resize(idx + 1, None);
        }
        self.styles[idx] = Some(style);
    }

    pub fn style(&self, istd: u16) -> Option<&StyleDescription> {
        self.styles.get(istd as usize).and_then(|s| s.as_ref())
    }

    /// Find a style index by name
    pub fn find(&self, name: &str) -> Option<u16> {
        self.styles
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.name == name))
            .map(|i| i as u16)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.iter().all(|s| s.is_none())
    }

    /// Base paragraph properties of `istd`; defaults for unknown or nil styles
    pub fn paragraph_style(&self, istd: u16) -> ParagraphProperties {
        let mut props = self
            .style(istd)
            .map(|s| s.paragraph.clone())
            .unwrap_or_default();
        props.istd = istd;
        props
    }

    /// Base character properties of `istd`; defaults for unknown or nil styles
    pub fn character_style(&self, istd: u16) -> CharacterProperties {
        self.style(istd)
            .map(|s| s.character.clone())
            .unwrap_or_default()
    }
}

//! Character run properties (CHP) and their compressed form (CHPX)

use crate::sprm::{self, SprmBuffer, SprmOperation};
use crate::{NodePayload, Result, StyleSheet};
use serde::{Deserialize, Serialize};

/// Underline style (kul)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Underline {
    #[default]
    None,
    Single,
    WordsOnly,
    Double,
    Dotted,
    Thick,
    Other(u8),
}

impl Underline {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Underline::None,
            1 => Underline::Single,
            2 => Underline::WordsOnly,
            3 => Underline::Double,
            4 => Underline::Dotted,
            6 => Underline::Thick,
            other => Underline::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Underline::None => 0,
            Underline::Single => 1,
            Underline::WordsOnly => 2,
            Underline::Double => 3,
            Underline::Dotted => 4,
            Underline::Thick => 6,
            Underline::Other(code) => code,
        }
    }
}

/// Superscript / subscript position (iss)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalPosition {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

impl VerticalPosition {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => VerticalPosition::Superscript,
            2 => VerticalPosition::Subscript,
            _ => VerticalPosition::Baseline,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            VerticalPosition::Baseline => 0,
            VerticalPosition::Superscript => 1,
            VerticalPosition::Subscript => 2,
        }
    }
}

/// Decoded character properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProperties {
    /// Character style index
    pub istd: u16,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub outline: bool,
    pub shadow: bool,
    pub small_caps: bool,
    pub caps: bool,
    pub vanished: bool,
    /// Run holds special characters (field marks, pictures, footnote refs)
    pub special: bool,
    pub underline: Underline,
    /// Colour index (ico)
    pub color: u8,
    /// Font size in half points
    pub font_size: u16,
    pub font_index: u16,
    pub vertical_position: VerticalPosition,
    /// Extra character spacing in twips
    pub spacing: i16,
}

impl Default for CharacterProperties {
    fn default() -> Self {
        Self {
            istd: 10,
            bold: false,
            italic: false,
            strike: false,
            outline: false,
            shadow: false,
            small_caps: false,
            caps: false,
            vanished: false,
            special: false,
            underline: Underline::None,
            color: 0,
            font_size: 20,
            font_index: 0,
            vertical_position: VerticalPosition::Baseline,
            spacing: 0,
        }
    }
}

impl CharacterProperties {
    /// Apply one character sprm on top of `style`, the style these
    /// properties derive from (toggle operands resolve against it).
    pub fn apply_sprm(&mut self, op: &SprmOperation<'_>, style: &CharacterProperties) {
        let t = |value: bool| sprm::toggle(op.operand_u8(), value);
        match op.opcode {
            sprm::SPRM_C_ISTD => self.istd = op.operand_u16(),
            sprm::SPRM_C_F_BOLD => self.bold = t(style.bold),
            sprm::SPRM_C_F_ITALIC => self.italic = t(style.italic),
            sprm::SPRM_C_F_STRIKE => self.strike = t(style.strike),
            sprm::SPRM_C_F_OUTLINE => self.outline = t(style.outline),
            sprm::SPRM_C_F_SHADOW => self.shadow = t(style.shadow),
            sprm::SPRM_C_F_SMALL_CAPS => self.small_caps = t(style.small_caps),
            sprm::SPRM_C_F_CAPS => self.caps = t(style.caps),
            sprm::SPRM_C_F_VANISH => self.vanished = t(style.vanished),
            sprm::SPRM_C_F_SPEC => self.special = op.operand_u8() != 0,
            sprm::SPRM_C_KUL => self.underline = Underline::from_code(op.operand_u8()),
            sprm::SPRM_C_ICO => self.color = op.operand_u8(),
            sprm::SPRM_C_HPS => self.font_size = op.operand_u16(),
            sprm::SPRM_C_RG_FTC0 => self.font_index = op.operand_u16(),
            sprm::SPRM_C_ISS => {
                self.vertical_position = VerticalPosition::from_code(op.operand_u8())
            }
            sprm::SPRM_C_DXA_SPACE => self.spacing = op.operand_i16(),
            _ => {}
        }
    }

    /// Decode a grpprl on top of these (base) properties
    pub fn apply_sprms(&mut self, sprms: &SprmBuffer) -> Result<()> {
        let style = self.clone();
        for op in sprms.iter() {
            self.apply_sprm(&op?, &style);
        }
        Ok(())
    }
}

/// Compress `props` into the sprms that differ from `base`
pub fn compress_character(props: &CharacterProperties, base: &CharacterProperties) -> Vec<u8> {
    let mut buf = SprmBuffer::new();
    let toggles = [
        (sprm::SPRM_C_F_BOLD, props.bold, base.bold),
        (sprm::SPRM_C_F_ITALIC, props.italic, base.italic),
        (sprm::SPRM_C_F_STRIKE, props.strike, base.strike),
        (sprm::SPRM_C_F_OUTLINE, props.outline, base.outline),
        (sprm::SPRM_C_F_SHADOW, props.shadow, base.shadow),
        (sprm::SPRM_C_F_SMALL_CAPS, props.small_caps, base.small_caps),
        (sprm::SPRM_C_F_CAPS, props.caps, base.caps),
        (sprm::SPRM_C_F_VANISH, props.vanished, base.vanished),
        (sprm::SPRM_C_F_SPEC, props.special, base.special),
    ];

    if props.istd != base.istd {
        buf.append(sprm::SPRM_C_ISTD, &props.istd.to_le_bytes());
    }
    for (opcode, value, base_value) in toggles {
        if value != base_value {
            buf.append(opcode, &[value as u8]);
        }
    }
    if props.underline != base.underline {
        buf.append(sprm::SPRM_C_KUL, &[props.underline.code()]);
    }
    if props.color != base.color {
        buf.append(sprm::SPRM_C_ICO, &[props.color]);
    }
    if props.font_size != base.font_size {
        buf.append(sprm::SPRM_C_HPS, &props.font_size.to_le_bytes());
    }
    if props.font_index != base.font_index {
        buf.append(sprm::SPRM_C_RG_FTC0, &props.font_index.to_le_bytes());
    }
    if props.vertical_position != base.vertical_position {
        buf.append(sprm::SPRM_C_ISS, &[props.vertical_position.code()]);
    }
    if props.spacing != base.spacing {
        buf.append(sprm::SPRM_C_DXA_SPACE, &props.spacing.to_le_bytes());
    }

    buf.as_bytes().to_vec()
}

/// Payload of a character run table node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chpx {
    pub sprms: SprmBuffer,
}

impl Chpx {
    pub fn new(sprms: SprmBuffer) -> Self {
        Self { sprms }
    }

    /// Compress `props` against the character style of paragraph style `istd`
    pub fn compress(props: &CharacterProperties, istd: u16, styles: &StyleSheet) -> Result<Self> {
        let base = styles.character_style(istd);
        let sprms = SprmBuffer::from_bytes(compress_character(props, &base))?;
        Ok(Self { sprms })
    }

    /// Decode against the character style of the enclosing paragraph's style
    pub fn properties(&self, istd: u16, styles: &StyleSheet) -> Result<CharacterProperties> {
        let mut props = styles.character_style(istd);
        props.apply_sprms(&self.sprms)?;
        Ok(props)
    }
}

impl NodePayload for Chpx {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_then_decode() {
        let styles = StyleSheet::default();
        let props = CharacterProperties {
            bold: true,
            underline: Underline::Double,
            font_size: 28,
            color: 6,
            vertical_position: VerticalPosition::Superscript,
            ..Default::default()
        };
        let chpx = Chpx::compress(&props, 0, &styles).unwrap();
        assert_eq!(chpx.properties(0, &styles).unwrap(), props);
    }

    #[test]
    fn test_toggle_resolves_against_style() {
        let style = CharacterProperties {
            bold: true,
            ..Default::default()
        };
        let mut buf = SprmBuffer::new();
        buf.append(sprm::SPRM_C_F_BOLD, &[sprm::TOGGLE_INVERT_STYLE]);
        let mut props = style.clone();
        props.apply_sprms(&buf).unwrap();
        assert!(!props.bold);
    }

    #[test]
    fn test_underline_codes() {
        assert_eq!(Underline::from_code(3), Underline::Double);
        assert_eq!(Underline::from_code(27).code(), 27);
    }
}

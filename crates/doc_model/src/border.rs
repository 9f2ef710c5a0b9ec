//! Border codes (BRC) shared by paragraphs and table cells

use serde::{Deserialize, Serialize};

/// Four-byte border descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BorderCode {
    /// Line width in eighths of a point
    pub line_width: u8,
    /// Border type (0 = none, 1 = single, 3 = double, ...)
    pub border_type: u8,
    /// Colour index
    pub color: u8,
    /// Space between border and text, in points (5 bits)
    pub space: u8,
    pub shadow: bool,
    pub frame: bool,
}

impl BorderCode {
    pub fn single(line_width: u8) -> Self {
        Self {
            line_width,
            border_type: 1,
            ..Default::default()
        }
    }

    /// A border with type 0 or 0xFF draws nothing
    pub fn is_empty(&self) -> bool {
        self.border_type == 0 || self.border_type == 0xFF
    }

    pub fn from_u32(value: u32) -> Self {
        let bytes = value.to_le_bytes();
        Self {
            line_width: bytes[0],
            border_type: bytes[1],
            color: bytes[2],
            space: bytes[3] & 0x1F,
            shadow: bytes[3] & 0x20 != 0,
            frame: bytes[3] & 0x40 != 0,
        }
    }

    pub fn to_u32(&self) -> u32 {
        let mut flags = self.space & 0x1F;
        if self.shadow {
            flags |= 0x20;
        }
        if self.frame {
            flags |= 0x40;
        }
        u32::from_le_bytes([self.line_width, self.border_type, self.color, flags])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brc_packing() {
        let brc = BorderCode {
            line_width: 8,
            border_type: 3,
            color: 6,
            space: 4,
            shadow: true,
            frame: false,
        };
        let packed = brc.to_u32();
        assert_eq!(packed & 0xFF, 8);
        assert_eq!(BorderCode::from_u32(packed), brc);
        assert!(BorderCode::default().is_empty());
        assert!(!BorderCode::single(4).is_empty());
    }
}

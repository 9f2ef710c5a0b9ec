//! CharacterRun - one run of uniformly formatted text

use crate::{DocumentEditor, RangeId, RangeKind, Result, TextRange};
use doc_model::sprm;
use doc_model::{CharacterProperties, PropertyKind, Underline, VerticalPosition};

/// A character run clipped to the range it was taken from
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterRun {
    id: RangeId,
    props: CharacterProperties,
}

impl DocumentEditor {
    /// The `index`-th character run overlapping the range
    pub fn character_run(&mut self, id: RangeId, index: usize) -> Result<CharacterRun> {
        let node = self.node_index(id, PropertyKind::CharacterRun, index)?;
        let (start, end) = self.clipped_span(id, PropertyKind::CharacterRun, node)?;
        let props = self.doc.character_properties(node)?;
        let view = self.child(id, start, end, RangeKind::CharacterRun)?;
        Ok(CharacterRun { id: view, props })
    }

    pub fn character_runs(&mut self, id: RangeId) -> Result<Vec<CharacterRun>> {
        let count = self.num_character_runs(id)?;
        (0..count).map(|i| self.character_run(id, i)).collect()
    }

    fn update_run(&mut self, id: RangeId, opcode: u16, operand: &[u8]) -> Result<()> {
        let node = self.node_index(id, PropertyKind::CharacterRun, 0)?;
        self.doc
            .runs_mut()
            .payload_mut(node)?
            .sprms
            .update(opcode, operand);
        Ok(())
    }
}

macro_rules! toggle_property {
    ($get:ident, $set:ident, $field:ident, $opcode:path) => {
        pub fn $get(&self) -> bool {
            self.props.$field
        }

        pub fn $set(&mut self, editor: &mut DocumentEditor, value: bool) -> Result<()> {
            editor.update_run(self.id, $opcode, &[value as u8])?;
            self.props.$field = value;
            Ok(())
        }
    };
}

impl CharacterRun {
    pub fn range_id(&self) -> RangeId {
        self.id
    }

    pub fn properties(&self) -> &CharacterProperties {
        &self.props
    }

    toggle_property!(is_bold, set_bold, bold, sprm::SPRM_C_F_BOLD);
    toggle_property!(is_italic, set_italic, italic, sprm::SPRM_C_F_ITALIC);
    toggle_property!(is_strike_through, set_strike_through, strike, sprm::SPRM_C_F_STRIKE);
    toggle_property!(is_outlined, set_outline, outline, sprm::SPRM_C_F_OUTLINE);
    toggle_property!(is_shadowed, set_shadow, shadow, sprm::SPRM_C_F_SHADOW);
    toggle_property!(is_small_caps, set_small_caps, small_caps, sprm::SPRM_C_F_SMALL_CAPS);
    toggle_property!(is_caps, set_caps, caps, sprm::SPRM_C_F_CAPS);
    toggle_property!(is_vanished, set_vanished, vanished, sprm::SPRM_C_F_VANISH);

    /// Whether the run holds special characters such as field marks
    pub fn is_special(&self) -> bool {
        self.props.special
    }

    pub fn set_special(&mut self, editor: &mut DocumentEditor, value: bool) -> Result<()> {
        editor.update_run(self.id, sprm::SPRM_C_F_SPEC, &[value as u8])?;
        self.props.special = value;
        Ok(())
    }

    pub fn style_index(&self) -> u16 {
        self.props.istd
    }

    pub fn set_style_index(&mut self, editor: &mut DocumentEditor, istd: u16) -> Result<()> {
        editor.update_run(self.id, sprm::SPRM_C_ISTD, &istd.to_le_bytes())?;
        self.props.istd = istd;
        Ok(())
    }

    pub fn underline(&self) -> Underline {
        self.props.underline
    }

    pub fn set_underline(&mut self, editor: &mut DocumentEditor, value: Underline) -> Result<()> {
        editor.update_run(self.id, sprm::SPRM_C_KUL, &[value.code()])?;
        self.props.underline = value;
        Ok(())
    }

    /// Colour index (ico)
    pub fn color(&self) -> u8 {
        self.props.color
    }

    pub fn set_color(&mut self, editor: &mut DocumentEditor, ico: u8) -> Result<()> {
        editor.update_run(self.id, sprm::SPRM_C_ICO, &[ico])?;
        self.props.color = ico;
        Ok(())
    }

    /// Font size in half points
    pub fn font_size(&self) -> u16 {
        self.props.font_size
    }

    pub fn set_font_size(&mut self, editor: &mut DocumentEditor, half_points: u16) -> Result<()> {
        editor.update_run(self.id, sprm::SPRM_C_HPS, &half_points.to_le_bytes())?;
        self.props.font_size = half_points;
        Ok(())
    }

    pub fn font_index(&self) -> u16 {
        self.props.font_index
    }

    pub fn set_font_index(&mut self, editor: &mut DocumentEditor, ftc: u16) -> Result<()> {
        editor.update_run(self.id, sprm::SPRM_C_RG_FTC0, &ftc.to_le_bytes())?;
        self.props.font_index = ftc;
        Ok(())
    }

    pub fn vertical_position(&self) -> VerticalPosition {
        self.props.vertical_position
    }

    pub fn set_vertical_position(
        &mut self,
        editor: &mut DocumentEditor,
        value: VerticalPosition,
    ) -> Result<()> {
        editor.update_run(self.id, sprm::SPRM_C_ISS, &[value.code()])?;
        self.props.vertical_position = value;
        Ok(())
    }

    /// Extra spacing between characters, in twips
    pub fn character_spacing(&self) -> i16 {
        self.props.spacing
    }

    pub fn set_character_spacing(&mut self, editor: &mut DocumentEditor, twips: i16) -> Result<()> {
        editor.update_run(self.id, sprm::SPRM_C_DXA_SPACE, &twips.to_le_bytes())?;
        self.props.spacing = twips;
        Ok(())
    }
}

impl TextRange for CharacterRun {
    fn range_id(&self) -> RangeId {
        CharacterRun::range_id(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{DocumentBuilder, ParagraphProperties};

    fn editor() -> DocumentEditor {
        let bold = CharacterProperties {
            bold: true,
            ..Default::default()
        };
        let doc = DocumentBuilder::new()
            .paragraph_with(
                ParagraphProperties::default(),
                vec![
                    ("Plain ".to_string(), CharacterProperties::default()),
                    ("strong".to_string(), bold),
                ],
            )
            .build()
            .unwrap();
        DocumentEditor::new(doc)
    }

    #[test]
    fn test_runs_decode_properties() {
        let mut ed = editor();
        let all = ed.overall_range();
        let runs = ed.character_runs(all).unwrap();
        assert_eq!(runs.len(), 2);
        assert!(!runs[0].is_bold());
        assert_eq!(runs[0].text(&ed).unwrap(), "Plain ");
        assert!(runs[1].is_bold());
        // the paragraph mark joins the last run
        assert_eq!(runs[1].text(&ed).unwrap(), "strong\r");
    }

    #[test]
    fn test_setters_round_trip_through_sprms() {
        let mut ed = editor();
        let all = ed.overall_range();
        let mut run = ed.character_run(all, 0).unwrap();
        run.set_italic(&mut ed, true).unwrap();
        run.set_font_size(&mut ed, 28).unwrap();
        run.set_underline(&mut ed, Underline::Double).unwrap();
        run.set_vertical_position(&mut ed, VerticalPosition::Superscript)
            .unwrap();
        run.set_character_spacing(&mut ed, -20).unwrap();

        let reread = ed.character_run(all, 0).unwrap();
        assert_eq!(reread.properties(), run.properties());
        assert!(reread.is_italic());
        assert_eq!(reread.font_size(), 28);
        assert_eq!(reread.character_spacing(), -20);

        run.set_italic(&mut ed, false).unwrap();
        assert!(!ed.character_run(all, 0).unwrap().is_italic());
    }

    #[test]
    fn test_run_clipped_to_parent() {
        let mut ed = editor();
        let all = ed.overall_range();
        let part = ed.sub_range(all, 2, 8).unwrap();
        let runs = ed.character_runs(part).unwrap();
        assert_eq!(runs[0].text(&ed).unwrap(), "ain ");
        assert_eq!(runs[1].text(&ed).unwrap(), "st");
        assert!(ed.character_run(part, 2).is_err());
    }
}

use crate::measure::{FontRole, TextMeasurer, TextMetrics, TextPainter};
use tiny_skia::{Path, PathBuilder, Rect};

/// Deterministic measurer: every character is a box `em * size` wide,
/// ascent is 0.8 of the size and descent 0.2.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoxMeasurer {
    pub primary_em: f32,
    pub secondary_em: f32,
}

impl BoxMeasurer {
    /// Annotation glyphs half as wide as base glyphs.
    pub(crate) fn narrow() -> Self {
        Self {
            primary_em: 1.0,
            secondary_em: 0.5,
        }
    }

    fn em(&self, role: FontRole) -> f32 {
        match role {
            FontRole::Primary => self.primary_em,
            FontRole::Secondary => self.secondary_em,
        }
    }

    fn char_width(&self, role: FontRole, size: u32) -> f32 {
        self.em(role) * size as f32
    }
}

impl TextMeasurer for BoxMeasurer {
    fn measure(&self, role: FontRole, size: u32, text: &str) -> TextMetrics {
        let count = text.chars().count() as f32;
        let ascent = (size * 4).div_ceil(5);
        let descent = size.div_ceil(5);
        TextMetrics {
            width: (count * self.char_width(role, size)).ceil() as u32,
            ascent,
            descent,
            line_height: ascent + descent,
        }
    }
}

impl TextPainter for BoxMeasurer {
    fn text_paths(&self, role: FontRole, size: u32, text: &str, x: f32, baseline: f32) -> Vec<Path> {
        let w = self.char_width(role, size);
        let ascent = size as f32 * 0.8;
        text.chars()
            .enumerate()
            .filter_map(|(i, _)| {
                let rect = Rect::from_xywh(x + i as f32 * w, baseline - ascent, w, ascent)?;
                Some(PathBuilder::from_rect(rect))
            })
            .collect()
    }
}

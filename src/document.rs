use crate::error::{Error, Result};
use crate::formatting::SelectionFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PRIMARY_SIZE: u32 = 32;
pub const DEFAULT_SECONDARY_SIZE: u32 = 18;

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// One base grapheme with its annotation and display color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    base: String,
    pub annotation: String,
    pub color: Rgb,
}

impl Unit {
    pub fn new(base: impl Into<String>, annotation: impl Into<String>, color: Rgb) -> Self {
        Self {
            base: base.into(),
            annotation: annotation.into(),
            color,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }
}

/// A single mutation of the document, produced by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Annotation { index: usize, text: String },
    Color { index: usize, color: Rgb },
    AllColors(Rgb),
    PrimarySize(u32),
    SecondarySize(u32),
    PrimaryFont(String),
    SecondaryFont(String),
}

/// What the owner has to redo after an [`Edit`] was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Secondary size must be searched again before layout.
    Refit,
    /// Layout only.
    Redraw,
    /// A manual secondary size overrides any pending refit.
    ManualSize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    units: Vec<Unit>,
    pub primary_font: String,
    pub primary_size: u32,
    pub secondary_font: String,
    pub secondary_size: u32,
    pub color: Rgb,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            units: Vec::new(),
            primary_font: "Microsoft YaHei".into(),
            primary_size: DEFAULT_PRIMARY_SIZE,
            secondary_font: "Arial".into(),
            secondary_size: DEFAULT_SECONDARY_SIZE,
            color: Rgb::BLACK,
        }
    }
}

impl Document {
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Replaces the whole unit sequence. Fonts, sizes and color carry over.
    pub(crate) fn replace_units(&mut self, units: Vec<Unit>) {
        self.units = units;
    }

    fn unit_mut(&mut self, index: usize) -> Result<&mut Unit> {
        let len = self.units.len();
        self.units
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })
    }

    pub fn set_annotation(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        self.unit_mut(index)?.annotation = text.into();
        Ok(())
    }

    pub fn set_color(&mut self, index: usize, color: Rgb) -> Result<()> {
        self.unit_mut(index)?.color = color;
        Ok(())
    }

    /// Recolors every unit and makes `color` the default for future units.
    pub fn set_all_colors(&mut self, color: Rgb) {
        self.color = color;
        for unit in &mut self.units {
            unit.color = color;
        }
    }

    pub fn apply(&mut self, edit: Edit) -> Result<Change> {
        match edit {
            Edit::Annotation { index, text } => {
                self.set_annotation(index, text)?;
                Ok(Change::Refit)
            }
            Edit::Color { index, color } => {
                self.set_color(index, color)?;
                Ok(Change::Redraw)
            }
            Edit::AllColors(color) => {
                self.set_all_colors(color);
                Ok(Change::Redraw)
            }
            Edit::PrimarySize(size) => {
                self.primary_size = size.max(1);
                Ok(Change::Refit)
            }
            Edit::SecondarySize(size) => {
                self.secondary_size = size.max(1);
                Ok(Change::ManualSize)
            }
            Edit::PrimaryFont(family) => {
                self.primary_font = family;
                Ok(Change::Redraw)
            }
            Edit::SecondaryFont(family) => {
                self.secondary_font = family;
                Ok(Change::Redraw)
            }
        }
    }

    /// Applies detected source formatting: size, colors and nothing else.
    ///
    /// A color list with one entry per unit colors the units individually; a
    /// single color (or a mismatched list) recolors every unit with the
    /// first one. The document default color is left alone so a later
    /// unformatted capture starts from it again.
    pub fn apply_format(&mut self, format: &SelectionFormat) {
        if let Some(size) = format.size {
            self.primary_size = size;
        }
        if format.colors.len() == self.units.len() && format.colors.len() > 1 {
            for (unit, color) in self.units.iter_mut().zip(&format.colors) {
                unit.color = *color;
            }
        } else if let Some(first) = format.colors.first() {
            for unit in &mut self.units {
                unit.color = *first;
            }
        }
    }

    /// Base graphemes concatenated.
    pub fn text(&self) -> String {
        self.units.iter().map(Unit::base).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::default();
        doc.replace_units(vec![
            Unit::new('你', "nǐ", Rgb::BLACK),
            Unit::new('好', "hǎo", Rgb::BLACK),
        ]);
        doc
    }

    #[test]
    fn hex_round_trip() {
        let c = Rgb::from_hex("#1a2B3c").unwrap();
        assert_eq!(c, Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!(c.to_string(), "#1a2b3c");
        assert_eq!(Rgb::from_hex("12345"), None);
        assert_eq!(Rgb::from_hex("zzzzzz"), None);
    }

    #[test]
    fn annotation_edit_reads_back_exactly() {
        let mut doc = sample();
        assert_eq!(
            doc.apply(Edit::Annotation { index: 0, text: "ni3".into() }).unwrap(),
            Change::Refit
        );
        assert_eq!(doc.units()[0].annotation, "ni3");
        assert_eq!(doc.units()[0].base(), "你");
    }

    #[test]
    fn out_of_range_edit_is_rejected() {
        let mut doc = sample();
        let err = doc.set_color(5, Rgb::new(255, 0, 0)).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 5, len: 2 }));
    }

    #[test]
    fn recolor_all_updates_default() {
        let mut doc = sample();
        doc.set_color(1, Rgb::new(0, 0, 255)).unwrap();
        let red = Rgb::new(255, 0, 0);
        assert_eq!(doc.apply(Edit::AllColors(red)).unwrap(), Change::Redraw);
        assert_eq!(doc.color, red);
        assert!(doc.units().iter().all(|u| u.color == red));
    }

    #[test]
    fn manual_secondary_size_is_reported() {
        let mut doc = sample();
        assert_eq!(doc.apply(Edit::SecondarySize(12)).unwrap(), Change::ManualSize);
        assert_eq!(doc.secondary_size, 12);
    }

    #[test]
    fn format_colors_per_unit_or_whole() {
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);

        let mut doc = sample();
        doc.apply_format(&SelectionFormat {
            size: Some(40),
            colors: vec![red, blue],
            font_name: None,
        });
        assert_eq!(doc.primary_size, 40);
        assert_eq!(doc.units()[0].color, red);
        assert_eq!(doc.units()[1].color, blue);
        assert_eq!(doc.color, Rgb::BLACK);

        let mut doc = sample();
        doc.apply_format(&SelectionFormat {
            size: None,
            colors: vec![blue],
            font_name: None,
        });
        assert_eq!(doc.primary_size, DEFAULT_PRIMARY_SIZE);
        assert_eq!(doc.color, Rgb::BLACK);
        assert!(doc.units().iter().all(|u| u.color == blue));
    }
}

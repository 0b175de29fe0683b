//! Column layout shared by the raster and table backends.

use crate::document::{Document, Rgb};
use crate::measure::{FontRole, TextMeasurer};

/// Spacing constants in unscaled pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    /// Horizontal gap between two columns.
    pub spacing: u32,
    /// Vertical gap between the annotation row and the character row.
    pub row_gap: u32,
    /// Empty space below the character row.
    pub bottom_margin: u32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            spacing: 10,
            row_gap: 5,
            bottom_margin: 5,
        }
    }
}

/// One positioned unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub base: String,
    pub annotation: String,
    pub color: Rgb,
    pub column_x: u32,
    pub column_width: u32,
    pub primary_width: u32,
    pub secondary_width: u32,
}

impl Placement {
    /// Left edge of the centered base character.
    pub fn primary_x(&self) -> f32 {
        self.column_x as f32 + (self.column_width - self.primary_width) as f32 / 2.0
    }

    /// Left edge of the centered annotation.
    pub fn secondary_x(&self) -> f32 {
        self.column_x as f32 + (self.column_width - self.secondary_width) as f32 / 2.0
    }
}

/// Everything a backend needs to draw or encode a document, already scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub placements: Vec<Placement>,
    pub primary_size: u32,
    pub secondary_size: u32,
    pub primary_baseline: u32,
    pub secondary_baseline: u32,
    pub spacing: u32,
    /// Sum of column widths plus the spacing between columns (no trailing
    /// spacing).
    pub width: u32,
    pub height: u32,
}

impl Scene {
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// `value * scale`, rounded. Applied to every size and distance alike.
pub fn scaled(value: u32, scale: f32) -> u32 {
    (value as f32 * scale).round() as u32
}

/// Positions every unit of `doc` using its current sizes, multiplied by
/// `scale`.
pub fn compose<M: TextMeasurer + ?Sized>(
    doc: &Document,
    measurer: &M,
    params: &LayoutParams,
    scale: f32,
) -> Scene {
    let primary_size = scaled(doc.primary_size, scale).max(1);
    let secondary_size = scaled(doc.secondary_size, scale).max(1);
    let spacing = scaled(params.spacing, scale);
    let row_gap = scaled(params.row_gap, scale);
    let bottom_margin = scaled(params.bottom_margin, scale);

    let mut placements = Vec::with_capacity(doc.len());
    let mut x = 0u32;
    for unit in doc.units() {
        if !placements.is_empty() {
            x += spacing;
        }
        let primary_width = measurer.measure(FontRole::Primary, primary_size, unit.base()).width;
        let secondary_width = measurer
            .measure(FontRole::Secondary, secondary_size, &unit.annotation)
            .width;
        let column_width = primary_width.max(secondary_width);
        placements.push(Placement {
            base: unit.base().to_string(),
            annotation: unit.annotation.clone(),
            color: unit.color,
            column_x: x,
            column_width,
            primary_width,
            secondary_width,
        });
        x += column_width;
    }

    // Row metrics come from the fonts, not from the text, so every column
    // shares the same two baselines.
    let secondary = measurer.measure(FontRole::Secondary, secondary_size, "");
    let primary = measurer.measure(FontRole::Primary, primary_size, "");

    Scene {
        placements,
        primary_size,
        secondary_size,
        secondary_baseline: secondary.ascent,
        primary_baseline: secondary.line_height + row_gap + primary.ascent,
        spacing,
        width: x,
        height: secondary.line_height + row_gap + primary.line_height + bottom_margin,
    }
}

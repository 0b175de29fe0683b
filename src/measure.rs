//! The text-measurement seam between the layout core and a font backend.

use tiny_skia::Path;

/// Which of the two document fonts a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// Base characters.
    Primary,
    /// Annotations.
    Secondary,
}

/// Pixel metrics of a run of text at one size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextMetrics {
    pub width: u32,
    pub ascent: u32,
    pub descent: u32,
    pub line_height: u32,
}

/// Must return identical results for identical arguments within a process.
pub trait TextMeasurer {
    fn measure(&self, role: FontRole, size: u32, text: &str) -> TextMetrics;
}

/// A measurer that can also produce fillable glyph outlines.
pub trait TextPainter: TextMeasurer {
    /// Outlines of `text` with the pen starting at `(x, baseline)` in pixels,
    /// Y pointing down.
    fn text_paths(&self, role: FontRole, size: u32, text: &str, x: f32, baseline: f32) -> Vec<Path>;
}

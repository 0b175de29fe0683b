use crate::error::{Error, Result};
use crate::layout::Scene;
use crate::measure::{FontRole, TextPainter};
use std::path::Path;
use tiny_skia::{FillRule, Paint, Pixmap, Transform};

/// Upscale factor used for clipboard image export.
pub const EXPORT_SCALE: f32 = 6.0;

/// Straight (non-premultiplied) RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl RasterImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.rgba.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        image::save_buffer(path, &self.rgba, self.width, self.height, image::ColorType::Rgba8)
            .map_err(|e| Error::Other(format!("failed to write {}: {}", path.display(), e)))
    }
}

/// Draws every annotation, then its base character, onto a transparent canvas
/// the size of the scene.
pub fn rasterize<P: TextPainter + ?Sized>(scene: &Scene, painter: &P) -> Result<RasterImage> {
    if scene.is_empty() {
        return Err(Error::EmptyScene);
    }
    let mut pixmap = Pixmap::new(scene.width, scene.height).ok_or(Error::EmptyScene)?;

    for placement in &scene.placements {
        let mut paint = Paint::default();
        paint.set_color_rgba8(placement.color.r, placement.color.g, placement.color.b, 255);
        paint.anti_alias = true;

        let secondary = painter.text_paths(
            FontRole::Secondary,
            scene.secondary_size,
            &placement.annotation,
            placement.secondary_x(),
            scene.secondary_baseline as f32,
        );
        let primary = painter.text_paths(
            FontRole::Primary,
            scene.primary_size,
            &placement.base,
            placement.primary_x(),
            scene.primary_baseline as f32,
        );
        for path in secondary.iter().chain(&primary) {
            pixmap.fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    let rgba = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Ok(RasterImage {
        width: scene.width,
        height: scene.height,
        rgba,
    })
}

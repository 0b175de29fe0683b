use crate::error::{Error, Result};
use crate::measure::{FontRole, TextMeasurer, TextMetrics, TextPainter};
use fontdb::{Database, Family, Query};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::{Path, PathBuilder, Transform};
use ttf_parser::{name_id, Face, GlyphId, OutlineBuilder};

/// A parsed font face kept as raw bytes so it can be shared across threads.
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
    family: String,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    fallback_advance: u16,
}

impl FontFace {
    pub fn from_data(data: Vec<u8>, index: u32, requested: &str) -> Result<Self> {
        let face = Face::parse(&data, index).map_err(|e| Error::FontParse {
            family: requested.to_string(),
            reason: e.to_string(),
        })?;
        let units_per_em = face.units_per_em().max(1);
        let fallback_advance = face
            .glyph_index(' ')
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(units_per_em / 2);
        let family = family_name(&face).unwrap_or_else(|| requested.to_string());
        let (ascender, descender) = (face.ascender(), face.descender());
        drop(face);
        Ok(Self {
            data: Arc::new(data),
            index,
            family,
            units_per_em,
            ascender,
            descender,
            fallback_advance,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.face().and_then(|face| face.glyph_index(ch)).is_some()
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.index).ok()
    }

    fn scale(&self, size: u32) -> f32 {
        size as f32 / self.units_per_em as f32
    }

    fn advance_units(&self, face: &Face<'_>, ch: char) -> u16 {
        face.glyph_index(ch)
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(self.fallback_advance)
    }

    pub fn measure(&self, size: u32, text: &str) -> TextMetrics {
        let scale = self.scale(size);
        let advance: u32 = match self.face() {
            Some(face) => text
                .chars()
                .map(|ch| self.advance_units(&face, ch) as u32)
                .sum(),
            None => 0,
        };
        let ascent = (self.ascender.max(0) as f32 * scale).ceil() as u32;
        let descent = ((-(self.descender.min(0) as i32)) as f32 * scale).ceil() as u32;
        TextMetrics {
            width: (advance as f32 * scale).ceil() as u32,
            ascent,
            descent,
            line_height: ascent + descent,
        }
    }

    pub fn text_paths(&self, size: u32, text: &str, x: f32, baseline: f32) -> Vec<Path> {
        let Some(face) = self.face() else {
            return Vec::new();
        };
        let scale = self.scale(size);
        let mut pen = x;
        let mut paths = Vec::new();
        for ch in text.chars() {
            if let Some(glyph) = face.glyph_index(ch) {
                if let Some(path) = glyph_path(&face, glyph) {
                    let transform = Transform::from_row(scale, 0.0, 0.0, -scale, pen, baseline);
                    if let Some(path) = path.transform(transform) {
                        paths.push(path);
                    }
                }
            }
            pen += self.advance_units(&face, ch) as f32 * scale;
        }
        paths
    }
}

struct PathSink(PathBuilder);

impl OutlineBuilder for PathSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.0.close();
    }
}

/// Glyph outline in font units, Y up.
fn glyph_path(face: &Face<'_>, glyph: GlyphId) -> Option<Path> {
    let mut sink = PathSink(PathBuilder::new());
    face.outline_glyph(glyph, &mut sink)?;
    sink.0.finish()
}

fn family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

/// System font database with a per-family cache of loaded faces.
pub struct FontLibrary {
    db: Database,
    cache: HashMap<String, Arc<FontFace>>,
}

impl FontLibrary {
    pub fn system() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        info!("font database loaded with {} faces", db.len());
        Self {
            db,
            cache: HashMap::new(),
        }
    }

    /// Family names of every installed face, sorted and deduplicated.
    pub fn families(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .db
            .faces()
            .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn load(&mut self, family: &str) -> Result<Arc<FontFace>> {
        if let Some(face) = self.cache.get(family) {
            return Ok(face.clone());
        }
        let families = [Family::Name(family)];
        let query = Query {
            families: &families,
            ..Default::default()
        };
        let id = self
            .db
            .query(&query)
            .ok_or_else(|| Error::FontNotFound(family.to_string()))?;
        let (data, index) = self
            .db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| Error::FontNotFound(family.to_string()))?;
        let face = Arc::new(FontFace::from_data(data, index, family)?);
        debug!("loaded font '{}' as '{}'", family, face.family());
        self.cache.insert(family.to_string(), face.clone());
        Ok(face)
    }

    /// The first of `candidates` that loads, else the system sans-serif
    /// family.
    pub fn first_available<'a, I>(&mut self, candidates: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        for family in candidates {
            if self.load(family).is_ok() {
                return family.to_string();
            }
        }
        self.db.family_name(&Family::SansSerif).to_string()
    }

    /// Resolves both document fonts. Either failing is fatal for layout.
    pub fn pair(&mut self, primary: &str, secondary: &str) -> Result<FontPair> {
        Ok(FontPair {
            primary: self.load(primary)?,
            secondary: self.load(secondary)?,
        })
    }
}

/// The two faces a document renders with.
#[derive(Clone)]
pub struct FontPair {
    pub primary: Arc<FontFace>,
    pub secondary: Arc<FontFace>,
}

impl FontPair {
    fn face(&self, role: FontRole) -> &FontFace {
        match role {
            FontRole::Primary => &self.primary,
            FontRole::Secondary => &self.secondary,
        }
    }
}

impl TextMeasurer for FontPair {
    fn measure(&self, role: FontRole, size: u32, text: &str) -> TextMetrics {
        self.face(role).measure(size, text)
    }
}

impl TextPainter for FontPair {
    fn text_paths(&self, role: FontRole, size: u32, text: &str, x: f32, baseline: f32) -> Vec<Path> {
        self.face(role).text_paths(size, text, x, baseline)
    }
}

use crate::document::{Document, Unit};
use pinyin::{Pinyin, ToPinyin, ToPinyinMulti};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Source of phonetic annotations for single characters.
pub trait PronunciationSource {
    /// The default reading, `None` when the character is unknown.
    fn lookup(&self, ch: char) -> Option<String>;

    /// Every known reading, in any order. Unknown characters yield nothing.
    fn variants(&self, ch: char) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToneStyle {
    /// `nǐ`
    #[default]
    Marks,
    /// `ni3`
    Numbers,
}

/// Hanyu Pinyin readings from the bundled `pinyin` tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinyinSource {
    pub style: ToneStyle,
}

impl PinyinSource {
    pub fn new(style: ToneStyle) -> Self {
        Self { style }
    }

    fn render(&self, p: Pinyin) -> String {
        match self.style {
            ToneStyle::Marks => p.with_tone().to_string(),
            ToneStyle::Numbers => p.with_tone_num_end().to_string(),
        }
    }
}

impl PronunciationSource for PinyinSource {
    fn lookup(&self, ch: char) -> Option<String> {
        ch.to_pinyin().map(|p| self.render(p))
    }

    fn variants(&self, ch: char) -> Vec<String> {
        ch.to_pinyin_multi()
            .map(|multi| multi.into_iter().map(|p| self.render(p)).collect())
            .unwrap_or_default()
    }
}

/// Builds one unit per extended grapheme cluster of `text`, colored with
/// `doc.color`. A base letter and its combining marks, or an emoji with its
/// modifiers, stay together in one column.
///
/// Returns `false` and leaves the document alone when `text` is empty.
pub fn build<S: PronunciationSource + ?Sized>(doc: &mut Document, text: &str, source: &S) -> bool {
    if text.is_empty() {
        return false;
    }
    let color = doc.color;
    let units = text
        .graphemes(true)
        .map(|g| Unit::new(g, default_annotation(source, g), color))
        .collect();
    doc.replace_units(units);
    true
}

/// Readings are keyed by the leading scalar of a grapheme.
fn lead(grapheme: &str) -> Option<char> {
    grapheme.chars().next()
}

fn default_annotation<S: PronunciationSource + ?Sized>(source: &S, grapheme: &str) -> String {
    lead(grapheme)
        .and_then(|ch| {
            source
                .lookup(ch)
                .filter(|s| !s.is_empty())
                .or_else(|| source.variants(ch).into_iter().find(|s| !s.is_empty()))
        })
        .unwrap_or_else(|| grapheme.to_string())
}

/// Alternate readings of `base`, deduplicated and sorted for stable menus.
pub fn variants<S: PronunciationSource + ?Sized>(source: &S, base: &str) -> Vec<String> {
    let Some(ch) = lead(base) else {
        return Vec::new();
    };
    let mut all = source.variants(ch);
    all.retain(|s| !s.is_empty());
    all.sort();
    all.dedup();
    all
}

//! Pinyin annotation for copied Chinese text.
//!
//! A double COPY (or COPY then CUT) captures the clipboard, every character
//! gets its reading, the annotation size is fitted so no reading is wider
//! than its character, and the result is laid out once and exported either
//! as an image or as an HTML table with matching column widths.

pub mod annotate;
pub mod autofit;
pub mod capture;
pub mod clipboard;
pub mod document;
pub mod error;
pub mod fonts;
pub mod formatting;
pub mod gesture;
pub mod hotkeys;
pub mod i18n;
pub mod layout;
pub mod measure;
pub mod render;
pub mod session;
pub mod settings;
pub mod update;

#[cfg(test)]
pub(crate) mod test_util;

pub use error::{Error, Result};

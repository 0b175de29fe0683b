use crate::error::{Error, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiLanguage {
    Chinese,
    English,
    Russian,
}

impl Default for UiLanguage {
    fn default() -> Self {
        UiLanguage::Chinese
    }
}

impl UiLanguage {
    /// Name of the language in itself, for the selector.
    pub fn label(&self) -> &'static str {
        match self {
            UiLanguage::Chinese => "中文",
            UiLanguage::English => "English",
            UiLanguage::Russian => "Русский",
        }
    }

    pub fn all() -> &'static [UiLanguage] {
        &[UiLanguage::English, UiLanguage::Russian, UiLanguage::Chinese]
    }
}

/// The only state that survives a restart. Font sizes and the document are
/// per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// UI display language
    pub ui_language: UiLanguage,
    /// Font families offered for the characters
    pub favorite_fonts_primary: Vec<String>,
    /// Font families offered for the annotations
    pub favorite_fonts_secondary: Vec<String>,
    /// Keep the window above others
    pub always_on_top: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ui_language: UiLanguage::Chinese,
            favorite_fonts_primary: vec!["Microsoft YaHei".to_string(), "KaiTi".to_string()],
            favorite_fonts_secondary: vec!["Arial".to_string()],
            always_on_top: false,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs_config().map(|mut p| {
            p.push("pinyin-helper");
            p.push("settings.json");
            p
        })
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Defaults for a missing or unreadable file.
    pub fn load_from(path: &Path) -> Self {
        let Ok(s) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&s).unwrap_or_else(|e| {
            warn!("ignoring malformed settings {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn save(&self) -> Result<()> {
        let path =
            Self::config_path().ok_or_else(|| Error::Other("cannot determine config dir".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn dirs_config() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library").join("Application Support"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
    }
}

/// An ordered list of font families without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Favorites(Vec<String>);

impl Favorites {
    pub fn new(families: Vec<String>) -> Self {
        let mut list = Favorites::default();
        for family in families {
            list.add(&family);
        }
        list
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn contains(&self, family: &str) -> bool {
        self.0.iter().any(|f| f == family)
    }

    /// Appends `family` unless present. Returns whether the list changed.
    pub fn add(&mut self, family: &str) -> bool {
        if family.is_empty() || self.contains(family) {
            return false;
        }
        self.0.push(family.to_string());
        true
    }

    /// Removes `family` and returns the family to select next: the one that
    /// took its place, or the new last entry.
    pub fn remove(&mut self, family: &str) -> Option<String> {
        let idx = self.0.iter().position(|f| f == family)?;
        self.0.remove(idx);
        let next = idx.min(self.0.len().checked_sub(1)?);
        self.0.get(next).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("pinyin-helper-test-{}-{}", std::process::id(), name))
            .join("settings.json")
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("round-trip");
        let settings = Settings {
            ui_language: UiLanguage::Russian,
            favorite_fonts_primary: vec!["SimSun".into()],
            favorite_fonts_secondary: vec!["Arial".into(), "Times New Roman".into()],
            always_on_top: true,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_or_partial_files_use_defaults() {
        assert_eq!(Settings::load_from(&temp_path("missing")), Settings::default());

        let path = temp_path("partial");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"always_on_top": true}"#).unwrap();
        let loaded = Settings::load_from(&path);
        assert!(loaded.always_on_top);
        assert_eq!(loaded.favorite_fonts_secondary, vec!["Arial".to_string()]);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn favorites_add_is_unique() {
        let mut fav = Favorites::new(vec!["A".into(), "B".into(), "A".into()]);
        assert_eq!(fav.as_slice(), ["A", "B"]);
        assert!(!fav.add("B"));
        assert!(fav.add("C"));
        assert_eq!(fav.as_slice(), ["A", "B", "C"]);
    }

    #[test]
    fn favorites_remove_picks_neighbour() {
        let mut fav = Favorites::new(vec!["A".into(), "B".into(), "C".into()]);
        assert_eq!(fav.remove("B").as_deref(), Some("C"));
        assert_eq!(fav.remove("C").as_deref(), Some("A"));
        assert_eq!(fav.remove("missing"), None);
        assert_eq!(fav.remove("A"), None);
        assert!(fav.as_slice().is_empty());
    }
}

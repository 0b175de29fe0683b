use crate::document::Rgb;
use log::debug;
use regex::Regex;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, OnceLock};
use std::thread;

/// Formatting of the text that was just copied in the source application.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionFormat {
    pub size: Option<u32>,
    pub colors: Vec<Rgb>,
    pub font_name: Option<String>,
}

impl SelectionFormat {
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.colors.is_empty() && self.font_name.is_none()
    }

    /// Takes every field `preferred` knows, keeping ours elsewhere.
    pub fn overlay(&mut self, preferred: SelectionFormat) {
        if preferred.size.is_some() {
            self.size = preferred.size;
        }
        if !preferred.colors.is_empty() {
            self.colors = preferred.colors;
        }
        if preferred.font_name.is_some() {
            self.font_name = preferred.font_name;
        }
    }
}

/// An optional platform integration able to inspect the active selection of
/// another application.
pub trait SelectionInspector: Send + Sync {
    fn inspect(&self) -> Option<SelectionFormat>;
}

/// Runs the inspector on a worker thread.
pub fn inspect_async(inspector: Arc<dyn SelectionInspector>) -> Receiver<Option<SelectionFormat>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(inspector.inspect());
    });
    rx
}

/// Holds one speculative inspection result for the next activation gesture
/// only.
#[derive(Default)]
pub struct Prefetch {
    pending: Option<Receiver<Option<SelectionFormat>>>,
}

impl Prefetch {
    /// Starts tracking a new inspection; any earlier result is dropped unread.
    pub fn arm(&mut self, rx: Receiver<Option<SelectionFormat>>) {
        if self.pending.replace(rx).is_some() {
            debug!("discarding stale formatting prefetch");
        }
    }

    /// Consumes the prefetched result if it has arrived. Either way the slot
    /// is emptied: a result still in flight belongs to a cycle that is over.
    pub fn take(&mut self) -> Option<SelectionFormat> {
        let rx = self.pending.take()?;
        match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

fn font_size_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"font-size:\s*(\d+(?:\.\d+)?)(pt|px)").expect("valid regex"))
}

fn color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[^-])color:\s*(#[0-9a-fA-F]{6})\b").expect("valid regex"))
}

fn family_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"font-family:\s*['"]?([^'";,]+)"#).expect("valid regex"))
}

/// Point size from the first `font-size` declaration of a copied HTML
/// fragment. Pixel sizes are converted at 0.75 pt/px; anything outside
/// 8..=300 pt is ignored.
pub fn detect_font_size(html: &str) -> Option<u32> {
    let caps = font_size_re().captures(html)?;
    let mut value: f32 = caps[1].parse().ok()?;
    if &caps[2] == "px" {
        value *= 0.75;
    }
    (8.0..=300.0).contains(&value).then_some(value as u32)
}

/// Everything [`SelectionFormat`] can hold that is recoverable from a copied
/// HTML fragment.
pub fn format_from_html(html: &str) -> SelectionFormat {
    SelectionFormat {
        size: detect_font_size(html),
        colors: color_re()
            .captures_iter(html)
            .filter_map(|caps| Rgb::from_hex(&caps[1]))
            .collect(),
        font_name: family_re()
            .captures(html)
            .map(|caps| caps[1].trim().to_string())
            .filter(|name| !name.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn overlay_prefers_inspected_fields() {
        let mut format = SelectionFormat {
            size: Some(32),
            colors: vec![Rgb::new(1, 1, 1)],
            font_name: None,
        };
        format.overlay(SelectionFormat {
            size: Some(20),
            colors: Vec::new(),
            font_name: Some("KaiTi".into()),
        });
        assert_eq!(format.size, Some(20));
        assert_eq!(format.colors, vec![Rgb::new(1, 1, 1)]);
        assert_eq!(format.font_name.as_deref(), Some("KaiTi"));
    }

    #[test]
    fn points_and_pixels() {
        assert_eq!(detect_font_size(r#"<span style="font-size: 24pt">x</span>"#), Some(24));
        assert_eq!(detect_font_size(r#"<span style="font-size:32px">x</span>"#), Some(24));
        assert_eq!(detect_font_size(r#"<span style="font-size: 10.5pt">x</span>"#), Some(10));
        assert_eq!(detect_font_size(r#"<span style="font-size: 2pt">x</span>"#), None);
        assert_eq!(detect_font_size(r#"<span style="font-size: 500pt">x</span>"#), None);
        assert_eq!(detect_font_size("<b>no size</b>"), None);
    }

    #[test]
    fn html_format() {
        let html = r#"<span style="font-family: 'KaiTi'; font-size: 20pt; color: #FF0000; background-color: #ffffff">你</span><span style="color: #0000ff">好</span>"#;
        let format = format_from_html(html);
        assert_eq!(format.size, Some(20));
        assert_eq!(format.colors, vec![Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)]);
        assert_eq!(format.font_name.as_deref(), Some("KaiTi"));
        assert!(format_from_html("plain").is_empty());
    }

    struct Fixed(u32);

    impl SelectionInspector for Fixed {
        fn inspect(&self) -> Option<SelectionFormat> {
            Some(SelectionFormat {
                size: Some(self.0),
                ..Default::default()
            })
        }
    }

    fn ready(rx: Receiver<Option<SelectionFormat>>) -> Receiver<Option<SelectionFormat>> {
        // Let the worker finish so `take` sees the result.
        let value = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let (tx, rx) = mpsc::channel();
        tx.send(value).unwrap();
        rx
    }

    #[test]
    fn prefetch_is_consumed_once() {
        let mut slot = Prefetch::default();
        slot.arm(ready(inspect_async(Arc::new(Fixed(40)))));
        assert_eq!(slot.take().and_then(|f| f.size), Some(40));
        assert!(!slot.is_armed());
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn rearming_discards_the_stale_result() {
        let mut slot = Prefetch::default();
        slot.arm(ready(inspect_async(Arc::new(Fixed(40)))));
        slot.arm(ready(inspect_async(Arc::new(Fixed(12)))));
        assert_eq!(slot.take().and_then(|f| f.size), Some(12));
    }

    #[test]
    fn unfinished_inspection_is_dropped() {
        let (_tx, rx) = mpsc::channel();
        let mut slot = Prefetch::default();
        slot.arm(rx);
        assert_eq!(slot.take(), None);
        assert!(!slot.is_armed());
    }
}

use crate::clipboard::ClipboardContents;
use crate::document::DEFAULT_PRIMARY_SIZE;
use crate::formatting::{format_from_html, SelectionFormat};
use crate::gesture::GestureEvent;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Wait between the gesture and reading the clipboard, so the source
    /// application has finished writing to it.
    pub settle: Duration,
    /// Primary size used when the copied text carries none.
    pub default_size: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(120),
            default_size: DEFAULT_PRIMARY_SIZE,
        }
    }
}

/// Text taken from the clipboard, ready for the annotation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub text: String,
    pub format: SelectionFormat,
}

pub fn clean_text(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `None` when there is no usable text; the caller keeps its document.
pub fn interpret(contents: &ClipboardContents, options: &CaptureOptions) -> Option<Capture> {
    let text = clean_text(contents.text.as_deref()?);
    if text.is_empty() {
        return None;
    }
    let mut format = contents
        .html
        .as_deref()
        .map(format_from_html)
        .unwrap_or_default();
    format.size.get_or_insert(options.default_size);
    Some(Capture { text, format })
}

/// A gesture waiting for the clipboard to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCapture {
    pub gesture: GestureEvent,
    pub due: Instant,
}

impl PendingCapture {
    pub fn new(gesture: GestureEvent, now: Instant, options: &CaptureOptions) -> Self {
        Self {
            gesture,
            due: now + options.settle,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.due.saturating_duration_since(now)
    }
}

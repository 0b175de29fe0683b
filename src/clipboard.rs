use crate::error::Result;
use crate::formatting::{format_from_html, SelectionFormat, SelectionInspector};
use crate::render::{RasterImage, RichText};
use arboard::{Clipboard, ImageData};
use log::{debug, warn};
use std::borrow::Cow;
use std::thread;
use std::time::Duration;

/// Whatever text flavors the clipboard held at read time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardContents {
    pub text: Option<String>,
    pub html: Option<String>,
}

pub trait ClipboardAccess {
    fn read(&mut self) -> Result<ClipboardContents>;
    fn write_image(&mut self, image: &RasterImage) -> Result<()>;
    fn write_rich_text(&mut self, rich: &RichText) -> Result<()>;
}

/// The system clipboard. The handle is kept open because on X11 the
/// clipboard contents live only as long as their owner.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl SystemClipboard {
    fn handle(&mut self) -> Result<&mut Clipboard> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new()?,
        };
        Ok(self.inner.insert(clipboard))
    }
}

impl ClipboardAccess for SystemClipboard {
    fn read(&mut self) -> Result<ClipboardContents> {
        let clipboard = self.handle()?;
        let text = clipboard.get_text().ok();
        let html = clipboard.get().html().ok();
        Ok(ClipboardContents { text, html })
    }

    fn write_image(&mut self, image: &RasterImage) -> Result<()> {
        self.handle()?.set_image(ImageData {
            width: image.width as usize,
            height: image.height as usize,
            bytes: Cow::Borrowed(&image.rgba),
        })?;
        Ok(())
    }

    fn write_rich_text(&mut self, rich: &RichText) -> Result<()> {
        self.handle()?
            .set_html(rich.html.as_str(), Some(rich.plain.as_str()))?;
        Ok(())
    }
}

type HtmlReader = fn() -> Result<Option<String>>;

fn system_html() -> Result<Option<String>> {
    Ok(Clipboard::new()?.get().html().ok())
}

/// Reads the formatting of the first COPY from the clipboard's HTML flavor
/// while the user may still be pressing the second key. A CUT or a second
/// COPY can leave only plain text behind in some applications.
pub struct ClipboardFormatting {
    settle: Duration,
    read_html: HtmlReader,
}

impl ClipboardFormatting {
    pub fn system(settle: Duration) -> Self {
        Self::with_reader(settle, system_html)
    }

    pub fn with_reader(settle: Duration, read_html: HtmlReader) -> Self {
        Self { settle, read_html }
    }
}

impl SelectionInspector for ClipboardFormatting {
    fn inspect(&self) -> Option<SelectionFormat> {
        // The source application writes the clipboard after the key event.
        thread::sleep(self.settle);
        match (self.read_html)() {
            Ok(Some(html)) => {
                let format = format_from_html(&html);
                debug!("early clipboard formatting: {:?}", format);
                (!format.is_empty()).then_some(format)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("early clipboard read failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Rgb;
    use crate::error::Error;

    fn red_html() -> Result<Option<String>> {
        Ok(Some(r#"<span style="font-size: 18pt; color: #ff0000">你</span>"#.into()))
    }

    fn plain_only() -> Result<Option<String>> {
        Ok(Some("<span>你</span>".into()))
    }

    fn busy() -> Result<Option<String>> {
        Err(Error::Clipboard("occupied".into()))
    }

    #[test]
    fn first_copy_formatting_is_read_from_html() {
        let format = ClipboardFormatting::with_reader(Duration::ZERO, red_html)
            .inspect()
            .unwrap();
        assert_eq!(format.size, Some(18));
        assert_eq!(format.colors, vec![Rgb::new(255, 0, 0)]);
    }

    #[test]
    fn nothing_useful_yields_none() {
        assert_eq!(ClipboardFormatting::with_reader(Duration::ZERO, plain_only).inspect(), None);
        assert_eq!(ClipboardFormatting::with_reader(Duration::ZERO, || Ok(None)).inspect(), None);
        assert_eq!(ClipboardFormatting::with_reader(Duration::ZERO, busy).inspect(), None);
    }
}

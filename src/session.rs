use crate::annotate::{self, PronunciationSource};
use crate::autofit::{fit_secondary_size, MIN_SECONDARY_SIZE};
use crate::document::{Change, Document, Edit};
use crate::error::Result;
use crate::formatting::SelectionFormat;
use crate::layout::{compose, LayoutParams, Scene};
use crate::measure::TextMeasurer;
use log::debug;

type Listener = Box<dyn FnMut(&Document)>;

/// Sole owner of the active document. Every mutation goes through here and
/// ends with a "changed" notification.
pub struct Session {
    doc: Document,
    needs_fit: bool,
    floor: u32,
    listeners: Vec<Listener>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Document::default())
    }
}

impl Session {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            needs_fit: false,
            floor: MIN_SECONDARY_SIZE,
            listeners: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn set_floor(&mut self, floor: u32) {
        self.floor = floor;
        self.needs_fit = true;
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&Document) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        for listener in &mut self.listeners {
            listener(&self.doc);
        }
    }

    /// Rebuilds the units from `text`. Empty text changes nothing and
    /// returns `false`.
    pub fn capture<S: PronunciationSource + ?Sized>(
        &mut self,
        text: &str,
        source: &S,
        format: Option<&SelectionFormat>,
    ) -> bool {
        if !annotate::build(&mut self.doc, text, source) {
            return false;
        }
        if let Some(format) = format {
            self.doc.apply_format(format);
        }
        debug!("captured {} units", self.doc.len());
        self.needs_fit = true;
        self.notify();
        true
    }

    pub fn apply(&mut self, edit: Edit) -> Result<()> {
        match self.doc.apply(edit)? {
            Change::Refit => self.needs_fit = true,
            Change::ManualSize => self.needs_fit = false,
            Change::Redraw => {}
        }
        self.notify();
        Ok(())
    }

    /// Re-runs auto-fit when the last edits asked for it, then lays out the
    /// document at `scale`.
    pub fn recompute<M: TextMeasurer + ?Sized>(
        &mut self,
        measurer: &M,
        params: &LayoutParams,
        scale: f32,
    ) -> Scene {
        if self.needs_fit {
            if let Some(size) =
                fit_secondary_size(self.doc.units(), self.doc.primary_size, self.floor, measurer)
            {
                debug!("auto-fit secondary size {}", size);
                self.doc.secondary_size = size;
            }
            self.needs_fit = false;
        }
        compose(&self.doc, measurer, params, scale)
    }

    /// Lays out without touching sizes, e.g. for an upscaled export.
    pub fn scene<M: TextMeasurer + ?Sized>(&self, measurer: &M, params: &LayoutParams, scale: f32) -> Scene {
        compose(&self.doc, measurer, params, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::PinyinSource;
    use crate::document::Rgb;
    use crate::test_util::BoxMeasurer;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn capture_fits_and_notifies() {
        let mut session = Session::default();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        session.subscribe(move |_| seen.set(seen.get() + 1));

        assert!(session.capture("你好", &PinyinSource::default(), None));
        assert_eq!(calls.get(), 1);
        let scene = session.recompute(&BoxMeasurer::narrow(), &LayoutParams::default(), 1.0);
        // "hǎo" at 0.5em must fit in 32px.
        assert_eq!(session.document().secondary_size, 21);
        assert_eq!(scene.placements.len(), 2);
    }

    #[test]
    fn empty_capture_keeps_document() {
        let mut session = Session::default();
        session.capture("好", &PinyinSource::default(), None);
        let before = session.document().clone();
        assert!(!session.capture("", &PinyinSource::default(), None));
        assert_eq!(session.document(), &before);
    }

    #[test]
    fn captured_format_applies() {
        let mut session = Session::default();
        let format = SelectionFormat {
            size: Some(48),
            colors: vec![Rgb::new(1, 2, 3)],
            font_name: None,
        };
        session.capture("你", &PinyinSource::default(), Some(&format));
        assert_eq!(session.document().primary_size, 48);
        assert_eq!(session.document().units()[0].color, Rgb::new(1, 2, 3));
    }

    #[test]
    fn manual_size_survives_until_next_refit() {
        let m = BoxMeasurer::narrow();
        let params = LayoutParams::default();
        let mut session = Session::default();
        session.capture("你好", &PinyinSource::default(), None);
        session.recompute(&m, &params, 1.0);

        session.apply(Edit::SecondarySize(12)).unwrap();
        session.recompute(&m, &params, 1.0);
        assert_eq!(session.document().secondary_size, 12);

        session.apply(Edit::Color { index: 0, color: Rgb::new(9, 9, 9) }).unwrap();
        session.recompute(&m, &params, 1.0);
        assert_eq!(session.document().secondary_size, 12);

        session
            .apply(Edit::Annotation { index: 1, text: "hao".into() })
            .unwrap();
        session.recompute(&m, &params, 1.0);
        assert_eq!(session.document().secondary_size, 21);
    }

    #[test]
    fn bad_index_is_reported_without_notifying() {
        let mut session = Session::default();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        session.subscribe(move |_| seen.set(seen.get() + 1));
        assert!(session
            .apply(Edit::Annotation { index: 3, text: "x".into() })
            .is_err());
        assert_eq!(calls.get(), 0);
    }
}

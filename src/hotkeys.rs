use crate::error::Result;
use crate::gesture::{GestureDetector, GestureEvent};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Instant;

/// Messages posted by the listener thread to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeySignal {
    Gesture(GestureEvent),
    /// Sent once when the keyboard hook could not be installed.
    Unavailable(String),
}

/// The keys a copy gesture is made of. Ctrl on Windows, Cmd on macOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordKey {
    CommandLeft,
    CommandRight,
    Copy,
    Cut,
}

/// Turns raw key presses into COPY/CUT chords and feeds them to a
/// [`GestureDetector`] with the default window.
///
/// Keys are only observed, never consumed, so the foreground application
/// still performs its own copy. Auto-repeat of a held key counts once.
#[derive(Debug, Default)]
pub struct ChordTracker {
    detector: GestureDetector,
    command: [bool; 2],
    copy_down: bool,
    cut_down: bool,
}

impl ChordTracker {
    fn command_held(&self) -> bool {
        self.command.iter().any(|&down| down)
    }

    pub fn on_press(&mut self, key: ChordKey, now: Instant) -> Option<GestureEvent> {
        match key {
            ChordKey::CommandLeft => self.command[0] = true,
            ChordKey::CommandRight => self.command[1] = true,
            ChordKey::Copy if !self.copy_down => {
                self.copy_down = true;
                if self.command_held() {
                    return Some(self.detector.on_copy_press(now));
                }
            }
            ChordKey::Cut if !self.cut_down => {
                self.cut_down = true;
                if self.command_held() {
                    return self.detector.on_cut_press(now);
                }
            }
            ChordKey::Copy | ChordKey::Cut => {}
        }
        None
    }

    pub fn on_release(&mut self, key: ChordKey) {
        match key {
            ChordKey::CommandLeft => self.command[0] = false,
            ChordKey::CommandRight => self.command[1] = false,
            ChordKey::Copy => self.copy_down = false,
            ChordKey::Cut => self.cut_down = false,
        }
    }
}

/// Handle to the passive keyboard listener.
///
/// The OS hook cannot be removed once installed. Dropping the handle turns
/// the callback into a no-op for the rest of the process.
pub struct HotkeyListener {
    active: Arc<AtomicBool>,
}

impl HotkeyListener {
    /// Installs the keyboard hook on its own thread. If the hook fails the
    /// reason is posted as [`HotkeySignal::Unavailable`].
    ///
    /// `wake` is called after each posted signal so the host can react even
    /// while its window is hidden.
    pub fn start<W>(sink: Sender<HotkeySignal>, wake: W) -> Result<Self>
    where
        W: Fn(&HotkeySignal) + Send + Sync + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        hook::spawn(sink, Arc::new(wake), active.clone())?;
        Ok(Self { active })
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Relaxed);
        debug!("hotkey listener deactivated");
    }
}

fn post<W>(sink: &Sender<HotkeySignal>, wake: &W, signal: HotkeySignal)
where
    W: Fn(&HotkeySignal) + ?Sized,
{
    if sink.send(signal.clone()).is_ok() {
        wake(&signal);
    }
}

#[cfg(any(windows, target_os = "macos"))]
mod hook {
    use super::{post, ChordKey, ChordTracker, HotkeySignal};
    use crate::error::{Error, Result};
    use log::{debug, error, info};
    use rdev::{EventType, Key};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::Sender;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn chord_key(key: Key) -> Option<ChordKey> {
        match key {
            #[cfg(target_os = "macos")]
            Key::MetaLeft => Some(ChordKey::CommandLeft),
            #[cfg(target_os = "macos")]
            Key::MetaRight => Some(ChordKey::CommandRight),
            #[cfg(not(target_os = "macos"))]
            Key::ControlLeft => Some(ChordKey::CommandLeft),
            #[cfg(not(target_os = "macos"))]
            Key::ControlRight => Some(ChordKey::CommandRight),
            Key::KeyC => Some(ChordKey::Copy),
            Key::KeyX => Some(ChordKey::Cut),
            _ => None,
        }
    }

    pub(super) fn spawn<W>(sink: Sender<HotkeySignal>, wake: Arc<W>, active: Arc<AtomicBool>) -> Result<()>
    where
        W: Fn(&HotkeySignal) + Send + Sync + 'static,
    {
        thread::Builder::new().name("hotkeys".into()).spawn(move || {
            let hook_sink = sink.clone();
            let hook_wake = wake.clone();
            let mut tracker = ChordTracker::default();
            info!("listening for copy gestures");
            let result = rdev::listen(move |event| {
                if !active.load(Ordering::Relaxed) {
                    return;
                }
                let gesture = match event.event_type {
                    EventType::KeyPress(key) => {
                        chord_key(key).and_then(|k| tracker.on_press(k, Instant::now()))
                    }
                    EventType::KeyRelease(key) => {
                        if let Some(k) = chord_key(key) {
                            tracker.on_release(k);
                        }
                        None
                    }
                    _ => None,
                };
                if let Some(gesture) = gesture {
                    debug!("gesture {:?}", gesture);
                    post(&hook_sink, &*hook_wake, HotkeySignal::Gesture(gesture));
                }
            });
            // `listen` only returns when the hook could not be installed.
            if let Err(e) = result {
                let err = Error::Hotkey(format!("{:?}", e));
                error!("{}", err);
                post(&sink, &*wake, HotkeySignal::Unavailable(err.to_string()));
            }
        })?;
        Ok(())
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
mod hook {
    use super::{post, HotkeySignal};
    use crate::error::{Error, Result};
    use log::warn;
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc::Sender;
    use std::sync::Arc;

    /// Grabbing the keys instead would swallow the copy in the foreground
    /// application, so gestures are simply unavailable here.
    pub(super) fn spawn<W>(sink: Sender<HotkeySignal>, wake: Arc<W>, _active: Arc<AtomicBool>) -> Result<()>
    where
        W: Fn(&HotkeySignal) + Send + Sync + 'static,
    {
        let err = Error::Hotkey("no passive keyboard hook on this platform".into());
        warn!("{}", err);
        post(&sink, &*wake, HotkeySignal::Unavailable(err.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn double_copy_is_seen_without_consuming_keys() {
        let mut t = ChordTracker::default();
        let t0 = Instant::now();
        assert_eq!(t.on_press(ChordKey::CommandLeft, t0), None);
        assert_eq!(t.on_press(ChordKey::Copy, t0), Some(GestureEvent::CopyDetected));
        t.on_release(ChordKey::Copy);
        let t1 = t0 + Duration::from_millis(250);
        assert_eq!(t.on_press(ChordKey::Copy, t1), Some(GestureEvent::CopyCopy));
    }

    #[test]
    fn plain_letters_are_ignored() {
        let mut t = ChordTracker::default();
        let t0 = Instant::now();
        assert_eq!(t.on_press(ChordKey::Copy, t0), None);
        t.on_release(ChordKey::Copy);
        assert_eq!(t.on_press(ChordKey::Cut, t0), None);
        t.on_release(ChordKey::Cut);

        t.on_press(ChordKey::CommandLeft, t0);
        t.on_release(ChordKey::CommandLeft);
        assert_eq!(t.on_press(ChordKey::Copy, t0), None);
    }

    #[test]
    fn held_key_repeat_counts_once() {
        let mut t = ChordTracker::default();
        let t0 = Instant::now();
        t.on_press(ChordKey::CommandLeft, t0);
        assert_eq!(t.on_press(ChordKey::Copy, t0), Some(GestureEvent::CopyDetected));
        let later = t0 + Duration::from_millis(100);
        assert_eq!(t.on_press(ChordKey::Copy, later), None);
        assert_eq!(t.on_press(ChordKey::Copy, later), None);
    }

    #[test]
    fn copy_then_cut_with_either_command_key() {
        let mut t = ChordTracker::default();
        let t0 = Instant::now();
        t.on_press(ChordKey::CommandRight, t0);
        assert_eq!(t.on_press(ChordKey::Copy, t0), Some(GestureEvent::CopyDetected));
        t.on_release(ChordKey::Copy);
        t.on_release(ChordKey::CommandRight);

        let t1 = t0 + Duration::from_millis(300);
        t.on_press(ChordKey::CommandLeft, t1);
        assert_eq!(t.on_press(ChordKey::Cut, t1), Some(GestureEvent::CopyCut));
    }

    #[test]
    fn cut_alone_does_nothing() {
        let mut t = ChordTracker::default();
        let t0 = Instant::now();
        t.on_press(ChordKey::CommandLeft, t0);
        assert_eq!(t.on_press(ChordKey::Cut, t0), None);
    }

    #[test]
    fn posted_signals_wake_the_host() {
        let (tx, rx) = mpsc::channel();
        let woken = Arc::new(AtomicBool::new(false));
        let flag = woken.clone();
        let wake = move |_: &HotkeySignal| flag.store(true, Ordering::Relaxed);

        post(&tx, &wake, HotkeySignal::Gesture(GestureEvent::CopyCopy));
        assert_eq!(rx.try_recv(), Ok(HotkeySignal::Gesture(GestureEvent::CopyCopy)));
        assert!(woken.load(Ordering::Relaxed));

        // A host that went away is not woken.
        drop(rx);
        woken.store(false, Ordering::Relaxed);
        post(&tx, &wake, HotkeySignal::Gesture(GestureEvent::CopyCut));
        assert!(!woken.load(Ordering::Relaxed));
    }
}

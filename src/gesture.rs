use std::time::{Duration, Instant};

/// Maximum delay between the two presses of a gesture.
pub const GESTURE_WINDOW: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// COPY pressed twice within the window.
    CopyCopy,
    /// COPY followed by CUT within the window.
    CopyCut,
    /// A first COPY press; a second press may follow.
    CopyDetected,
}

impl GestureEvent {
    /// Whether the gesture asks for a clipboard capture.
    pub fn is_activation(self) -> bool {
        matches!(self, GestureEvent::CopyCopy | GestureEvent::CopyCut)
    }
}

/// Turns timestamped COPY/CUT presses into [`GestureEvent`]s.
///
/// Only the most recent unpaired COPY press is remembered.
#[derive(Debug, Clone)]
pub struct GestureDetector {
    window: Duration,
    last_copy: Option<Instant>,
}

impl Default for GestureDetector {
    fn default() -> Self {
        Self::new(GESTURE_WINDOW)
    }
}

impl GestureDetector {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_copy: None,
        }
    }

    fn within_window(&self, now: Instant) -> bool {
        self.last_copy
            .is_some_and(|last| now.saturating_duration_since(last) < self.window)
    }

    pub fn on_copy_press(&mut self, now: Instant) -> GestureEvent {
        if self.within_window(now) {
            self.last_copy = None;
            GestureEvent::CopyCopy
        } else {
            self.last_copy = Some(now);
            GestureEvent::CopyDetected
        }
    }

    pub fn on_cut_press(&mut self, now: Instant) -> Option<GestureEvent> {
        let paired = self.within_window(now);
        self.last_copy = None;
        paired.then_some(GestureEvent::CopyCut)
    }

    pub fn is_armed(&self) -> bool {
        self.last_copy.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn double_copy_inside_window() {
        let t0 = Instant::now();
        let mut d = GestureDetector::default();
        assert_eq!(d.on_copy_press(t0), GestureEvent::CopyDetected);
        assert_eq!(d.on_copy_press(t0 + ms(599)), GestureEvent::CopyCopy);
        assert!(!d.is_armed());
    }

    #[test]
    fn double_copy_at_or_after_window() {
        let t0 = Instant::now();
        for gap in [600, 601, 2_000] {
            let mut d = GestureDetector::default();
            d.on_copy_press(t0);
            assert_eq!(d.on_copy_press(t0 + ms(gap)), GestureEvent::CopyDetected);
            assert!(d.is_armed());
        }
    }

    #[test]
    fn third_press_starts_fresh() {
        let t0 = Instant::now();
        let mut d = GestureDetector::default();
        assert_eq!(d.on_copy_press(t0), GestureEvent::CopyDetected);
        assert_eq!(d.on_copy_press(t0 + ms(300)), GestureEvent::CopyCopy);
        assert_eq!(d.on_copy_press(t0 + ms(500)), GestureEvent::CopyDetected);
        // The fresh timer pairs with a later press.
        assert_eq!(d.on_copy_press(t0 + ms(900)), GestureEvent::CopyCopy);
    }

    #[test]
    fn copy_then_cut() {
        let t0 = Instant::now();
        let mut d = GestureDetector::default();
        d.on_copy_press(t0);
        assert_eq!(d.on_cut_press(t0 + ms(200)), Some(GestureEvent::CopyCut));
        assert!(!d.is_armed());

        d.on_copy_press(t0 + ms(1_000));
        assert_eq!(d.on_cut_press(t0 + ms(1_600)), None);
        // A late cut still consumes the stored press.
        assert!(!d.is_armed());
    }

    #[test]
    fn lone_cut_never_fires() {
        let t0 = Instant::now();
        let mut d = GestureDetector::default();
        assert_eq!(d.on_cut_press(t0), None);
        assert_eq!(d.on_cut_press(t0 + ms(100)), None);
        assert_eq!(d.on_copy_press(t0 + ms(200)), GestureEvent::CopyDetected);
    }
}

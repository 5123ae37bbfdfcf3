//! Two-pointer geometry and sloppy-gesture detection
//!
//! A gesture is "sloppy" when a tracked pointer rests within the edge slop
//! of a screen border, which usually means the side of the hand is touching
//! the screen. Recognizers keep tracking sloppy gestures but stay silent
//! until the condition clears.

use std::cell::Cell;

use crate::config::{GestureConfig, ScreenMetrics};
use crate::input::event::TouchEvent;

/// Vector between pointer 0 and pointer 1 for the previous and current
/// snapshots, with lazily computed spans
#[derive(Debug, Clone)]
pub struct TwoFingerState {
    edge_slop: f32,
    screen: ScreenMetrics,
    prev_diff: (f32, f32),
    curr_diff: (f32, f32),
    prev_span: Cell<Option<f32>>,
    curr_span: Cell<Option<f32>>,
}

impl TwoFingerState {
    pub fn new(config: &GestureConfig, screen: ScreenMetrics) -> Self {
        Self {
            edge_slop: config.edge_slop,
            screen,
            prev_diff: (0.0, 0.0),
            curr_diff: (0.0, 0.0),
            prev_span: Cell::new(None),
            curr_span: Cell::new(None),
        }
    }

    /// Screen size changed, e.g. after an orientation change
    pub fn set_screen_metrics(&mut self, screen: ScreenMetrics) {
        self.screen = screen;
    }

    /// Recomputes the finger vectors from a pair of snapshots
    ///
    /// # Returns
    /// false if either snapshot has fewer than two pointers
    pub fn update(&mut self, prev: &TouchEvent, curr: &TouchEvent) -> bool {
        let (Some(prev_diff), Some(curr_diff)) = (finger_diff(prev), finger_diff(curr)) else {
            return false;
        };
        self.prev_diff = prev_diff;
        self.curr_diff = curr_diff;
        self.prev_span.set(None);
        self.curr_span.set(None);
        true
    }

    pub fn previous_diff(&self) -> (f32, f32) {
        self.prev_diff
    }

    pub fn current_diff(&self) -> (f32, f32) {
        self.curr_diff
    }

    /// Distance between the pointers in the current snapshot
    pub fn current_span(&self) -> f32 {
        cached_len(&self.curr_span, self.curr_diff)
    }

    /// Distance between the pointers in the previous snapshot
    pub fn previous_span(&self) -> f32 {
        cached_len(&self.prev_span, self.prev_diff)
    }

    /// Returns true if either of the first two pointers is within the edge
    /// slop of a screen border, in screen coordinates
    pub fn is_sloppy(&self, event: &TouchEvent) -> bool {
        let right = self.screen.width - self.edge_slop;
        let bottom = self.screen.height - self.edge_slop;

        (0..2).any(|index| match event.raw_position(index) {
            Some(p) => p.x < self.edge_slop || p.y < self.edge_slop || p.x > right || p.y > bottom,
            None => true,
        })
    }

    pub fn clear(&mut self) {
        self.prev_diff = (0.0, 0.0);
        self.curr_diff = (0.0, 0.0);
        self.prev_span.set(None);
        self.curr_span.set(None);
    }
}

fn finger_diff(event: &TouchEvent) -> Option<(f32, f32)> {
    let p0 = event.pointer(0)?;
    let p1 = event.pointer(1)?;
    Some((p1.x - p0.x, p1.y - p0.y))
}

fn cached_len(cache: &Cell<Option<f32>>, diff: (f32, f32)) -> f32 {
    if let Some(len) = cache.get() {
        return len;
    }
    let len = diff.0.hypot(diff.1);
    cache.set(Some(len));
    len
}


#[cfg(test)]
mod tests {
    use super::test_support::two;
    use super::*;
    use crate::input::event::TouchAction;

    fn state() -> TwoFingerState {
        TwoFingerState::new(&GestureConfig::default(), ScreenMetrics::new(1000.0, 800.0))
    }

    #[test]
    fn spans_follow_update() {
        let mut s = state();
        let prev = two(TouchAction::PointerDown, 0, (100.0, 100.0), (130.0, 140.0));
        let curr = two(TouchAction::Move, 10, (100.0, 100.0), (160.0, 180.0));
        assert!(s.update(&prev, &curr));
        assert_eq!(s.previous_span(), 50.0);
        assert_eq!(s.current_span(), 100.0);
        assert_eq!(s.current_diff(), (60.0, 80.0));
    }

    #[test]
    fn update_requires_two_pointers() {
        let mut s = state();
        let prev = two(TouchAction::PointerDown, 0, (1.0, 1.0), (2.0, 2.0));
        let mut curr = prev.clone();
        curr.pointers.truncate(1);
        assert!(!s.update(&prev, &curr));
    }

    #[test]
    fn sloppy_near_any_edge() {
        let s = state();
        let ok = two(TouchAction::PointerDown, 0, (100.0, 100.0), (500.0, 400.0));
        assert!(!s.is_sloppy(&ok));

        let left = two(TouchAction::PointerDown, 0, (5.0, 100.0), (500.0, 400.0));
        assert!(s.is_sloppy(&left));

        let bottom = two(TouchAction::PointerDown, 0, (100.0, 100.0), (500.0, 795.0));
        assert!(s.is_sloppy(&bottom));
    }

    #[test]
    fn sloppy_uses_screen_coordinates() {
        let s = state();
        // Local position is fine, but the view sits near the right border
        let event = two(TouchAction::PointerDown, 0, (100.0, 100.0), (300.0, 100.0))
            .with_raw_offset(700.0, 0.0);
        assert!(s.is_sloppy(&event));
    }
}

//! Two-finger vertical shove recognizer

use std::f32::consts::PI;

use tracing::{debug, trace};

use crate::config::{GestureConfig, ScreenMetrics};
use crate::input::detector::{DetectorCore, GestureDetector, GestureState};
use crate::input::event::{TouchAction, TouchEvent};
use crate::input::two_finger::TwoFingerState;

/// Finger vectors steeper than about 20 degrees off horizontal are sloppy
const MAX_TILT: f32 = 0.35;
const MIN_REVERSED_TILT: f32 = 2.79;

pub trait ShoveListener {
    fn on_shove_begin(&mut self, _detector: &ShoveDetector) -> bool {
        true
    }

    fn on_shove(&mut self, _detector: &ShoveDetector) -> bool {
        false
    }

    fn on_shove_end(&mut self, _detector: &ShoveDetector) {}
}

/// Reports the vertical movement of two side-by-side fingers
///
/// Same lifecycle as rotation, with a stricter sloppy test: the fingers
/// must be roughly level. Updates inside the dead-zone are ignored.
#[derive(Debug, Clone)]
pub struct ShoveDetector {
    core: DetectorCore,
    fingers: TwoFingerState,
    sloppy: bool,
    dead_zone: f32,
    prev_average_y: f32,
    curr_average_y: f32,
}

impl ShoveDetector {
    pub fn new(config: &GestureConfig, screen: ScreenMetrics) -> Self {
        Self {
            core: DetectorCore::new(config),
            fingers: TwoFingerState::new(config, screen),
            sloppy: false,
            dead_zone: config.shove_dead_zone,
            prev_average_y: 0.0,
            curr_average_y: 0.0,
        }
    }

    pub fn set_screen_metrics(&mut self, screen: ScreenMetrics) {
        self.fingers.set_screen_metrics(screen);
    }

    /// Vertical distance moved since the baseline, in pixels
    pub fn shove_pixels_delta(&self) -> f32 {
        self.curr_average_y - self.prev_average_y
    }

    pub fn time_delta(&self) -> u64 {
        self.core.time_delta()
    }

    fn update_state(&mut self, event: &TouchEvent) -> bool {
        if !self.core.update(event) {
            return false;
        }
        let Some(prev) = self.core.previous() else {
            return false;
        };
        if !self.fingers.update(prev, event) {
            return false;
        }
        self.prev_average_y = average_y(prev);
        self.curr_average_y = average_y(event);
        true
    }

    fn is_sloppy(&self, event: &TouchEvent) -> bool {
        if self.fingers.is_sloppy(event) {
            return true;
        }
        let (dx, dy) = self.fingers.current_diff();
        let angle = dy.atan2(dx).abs();
        let level = (0.0 < angle && angle < MAX_TILT) || (MIN_REVERSED_TILT < angle && angle < PI);
        !level
    }

    fn begin(&mut self, listener: &mut dyn ShoveListener) {
        let begun = listener.on_shove_begin(self);
        self.core.set_in_progress(begun);
        if begun {
            debug!("shove gesture began");
        }
    }

    fn end(&mut self, listener: &mut dyn ShoveListener) {
        if !self.sloppy {
            listener.on_shove_end(self);
            debug!("shove gesture ended");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.core.reset();
        self.fingers.clear();
        self.sloppy = false;
        self.prev_average_y = 0.0;
        self.curr_average_y = 0.0;
    }
}

fn average_y(event: &TouchEvent) -> f32 {
    match (event.pointer(0), event.pointer(1)) {
        (Some(a), Some(b)) => (a.y + b.y) / 2.0,
        _ => 0.0,
    }
}

impl GestureDetector for ShoveDetector {
    type Listener = dyn ShoveListener;

    fn state(&self) -> GestureState {
        self.core.state()
    }

    fn handle_start_progress_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener) {
        match event.action {
            TouchAction::PointerDown => {
                self.reset();
                self.core.start(event);
                if !self.update_state(event) {
                    self.reset();
                    return;
                }
                self.sloppy = self.is_sloppy(event);
                if !self.sloppy {
                    self.begin(listener);
                }
            }
            TouchAction::Move => {
                if !self.sloppy || !self.update_state(event) {
                    return;
                }
                self.sloppy = self.is_sloppy(event);
                if !self.sloppy {
                    // Deltas are measured from the event that cleared the slop
                    self.core.accept_current();
                    self.begin(listener);
                }
            }
            TouchAction::PointerUp | TouchAction::Up | TouchAction::Cancel => {
                if self.sloppy {
                    self.reset();
                }
            }
            TouchAction::Down => {}
        }
    }

    fn handle_in_progress_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener) {
        match event.action {
            TouchAction::PointerUp | TouchAction::Up => {
                self.update_state(event);
                self.end(listener);
            }
            TouchAction::Cancel => self.end(listener),
            TouchAction::Move => {
                if !self.update_state(event) {
                    self.end(listener);
                    return;
                }
                let delta = self.shove_pixels_delta();
                if self.core.pressure_accepted() && delta.abs() > self.dead_zone {
                    trace!(delta, "shove");
                    if listener.on_shove(self) {
                        self.core.accept_current();
                    }
                }
            }
            TouchAction::Down | TouchAction::PointerDown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::two_finger::test_support::two;

    #[derive(Default)]
    struct Recorder {
        begins: u32,
        ends: u32,
        deltas: Vec<f32>,
    }

    impl ShoveListener for Recorder {
        fn on_shove_begin(&mut self, _detector: &ShoveDetector) -> bool {
            self.begins += 1;
            true
        }

        fn on_shove(&mut self, detector: &ShoveDetector) -> bool {
            self.deltas.push(detector.shove_pixels_delta());
            true
        }

        fn on_shove_end(&mut self, _detector: &ShoveDetector) {
            self.ends += 1;
        }
    }

    fn detector() -> ShoveDetector {
        ShoveDetector::new(&GestureConfig::default(), ScreenMetrics::new(1000.0, 800.0))
    }

    #[test]
    fn level_fingers_shove_vertically() {
        let mut d = detector();
        let mut rec = Recorder::default();

        d.on_touch_event(&two(TouchAction::PointerDown, 0, (300.0, 400.0), (500.0, 410.0)), &mut rec);
        assert_eq!(rec.begins, 1);

        d.on_touch_event(&two(TouchAction::Move, 10, (300.0, 380.0), (500.0, 390.0)), &mut rec);
        assert_eq!(rec.deltas, vec![-20.0]);

        d.on_touch_event(&two(TouchAction::PointerUp, 20, (300.0, 380.0), (500.0, 390.0)), &mut rec);
        assert_eq!(rec.ends, 1);
    }

    #[test]
    fn steep_finger_vector_is_sloppy() {
        let mut d = detector();
        let mut rec = Recorder::default();
        d.on_touch_event(&two(TouchAction::PointerDown, 0, (300.0, 200.0), (320.0, 500.0)), &mut rec);
        assert_eq!(rec.begins, 0);
        assert!(!d.is_in_progress());
    }

    #[test]
    fn reversed_level_fingers_are_accepted() {
        let mut d = detector();
        let mut rec = Recorder::default();
        d.on_touch_event(&two(TouchAction::PointerDown, 0, (500.0, 400.0), (300.0, 410.0)), &mut rec);
        assert_eq!(rec.begins, 1);
    }

    #[test]
    fn dead_zone_ignores_tiny_moves() {
        let mut d = detector();
        let mut rec = Recorder::default();
        d.on_touch_event(&two(TouchAction::PointerDown, 0, (300.0, 400.0), (500.0, 410.0)), &mut rec);
        d.on_touch_event(&two(TouchAction::Move, 10, (300.0, 400.4), (500.0, 410.4)), &mut rec);
        assert!(rec.deltas.is_empty());
    }

    #[test]
    fn first_update_after_slop_clears_measures_from_clearing_event() {
        let mut d = detector();
        let mut rec = Recorder::default();

        d.on_touch_event(&two(TouchAction::PointerDown, 0, (300.0, 5.0), (500.0, 10.0)), &mut rec);
        assert_eq!(rec.begins, 0);
        d.on_touch_event(&two(TouchAction::Move, 10, (300.0, 100.0), (500.0, 110.0)), &mut rec);
        assert_eq!(rec.begins, 1);

        // No movement since the gesture began, so the dead-zone swallows it
        d.on_touch_event(&two(TouchAction::Move, 20, (300.0, 100.0), (500.0, 110.0)), &mut rec);
        assert!(rec.deltas.is_empty());

        d.on_touch_event(&two(TouchAction::Move, 30, (300.0, 90.0), (500.0, 100.0)), &mut rec);
        assert_eq!(rec.deltas, vec![-10.0]);
    }

    #[test]
    fn sloppy_gesture_never_reports_end() {
        let mut d = detector();
        let mut rec = Recorder::default();
        d.on_touch_event(&two(TouchAction::PointerDown, 0, (300.0, 5.0), (500.0, 10.0)), &mut rec);
        d.on_touch_event(&two(TouchAction::PointerUp, 10, (300.0, 5.0), (500.0, 10.0)), &mut rec);
        assert_eq!(rec.begins, 0);
        assert_eq!(rec.ends, 0);
    }
}

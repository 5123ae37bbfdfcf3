//! Single-pointer tap, double-tap and long-press recognizer
//!
//! Purely event driven: there are no timers. A long press is reported on
//! the first event seen after the long-press delay while the pointer is
//! still down and within the tap slop.

use tracing::debug;

use crate::config::GestureConfig;
use crate::domain::core::Point;
use crate::input::detector::{DetectorCore, GestureDetector, GestureState};
use crate::input::event::{TouchAction, TouchEvent};

pub trait TapListener {
    /// A tap completed without moving beyond the tap slop
    fn on_single_tap_up(&mut self, _point: Point) -> bool {
        false
    }

    /// Second tap went down close enough to the first one
    fn on_double_tap(&mut self, _point: Point) -> bool {
        false
    }

    fn on_long_press(&mut self, _point: Point) {}
}

#[derive(Debug, Clone, Copy)]
struct LastTap {
    point: Point,
    up_time: u64,
}

#[derive(Debug, Clone)]
pub struct TapDetector {
    core: DetectorCore,
    tap_slop: f32,
    double_tap_slop: f32,
    double_tap_timeout_ms: u64,
    long_press_timeout_ms: u64,
    down_point: Point,
    down_time: u64,
    in_tap_region: bool,
    long_pressed: bool,
    double_tapping: bool,
    last_tap: Option<LastTap>,
}

impl TapDetector {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            core: DetectorCore::new(config),
            tap_slop: config.tap_slop,
            double_tap_slop: config.double_tap_slop,
            double_tap_timeout_ms: config.double_tap_timeout_ms,
            long_press_timeout_ms: config.long_press_timeout_ms,
            down_point: Point::default(),
            down_time: 0,
            in_tap_region: false,
            long_pressed: false,
            double_tapping: false,
            last_tap: None,
        }
    }

    /// Where the current (or last) tap went down
    pub fn down_point(&self) -> Point {
        self.down_point
    }

    fn track(&mut self, event: &TouchEvent) {
        if let Some(p) = event.pointer(0) {
            let dx = p.x - self.down_point.x;
            let dy = p.y - self.down_point.y;
            if dx.hypot(dy) > self.tap_slop {
                self.in_tap_region = false;
            }
        }
    }

    fn check_long_press(&mut self, event: &TouchEvent, listener: &mut dyn TapListener) {
        let held = event.event_time_ms.saturating_sub(self.down_time);
        if self.in_tap_region && !self.long_pressed && held >= self.long_press_timeout_ms {
            self.long_pressed = true;
            debug!(x = self.down_point.x, y = self.down_point.y, held, "long press");
            listener.on_long_press(self.down_point);
        }
    }

    fn is_double_tap(&self, point: Point, time: u64) -> bool {
        let Some(last) = self.last_tap else {
            return false;
        };
        let gap = time.saturating_sub(last.up_time);
        let dx = point.x - last.point.x;
        let dy = point.y - last.point.y;
        gap <= self.double_tap_timeout_ms && dx.hypot(dy) <= self.double_tap_slop
    }
}

impl GestureDetector for TapDetector {
    type Listener = dyn TapListener;

    fn state(&self) -> GestureState {
        self.core.state()
    }

    fn handle_start_progress_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener) {
        if event.action != TouchAction::Down {
            return;
        }
        let Some(pointer) = event.pointer(0) else {
            return;
        };

        self.core.start(event);
        self.core.set_in_progress(true);
        self.down_point = pointer.position();
        self.down_time = event.event_time_ms;
        self.in_tap_region = true;
        self.long_pressed = false;
        self.double_tapping = self.is_double_tap(self.down_point, self.down_time);

        if self.double_tapping {
            self.last_tap = None;
            debug!(x = self.down_point.x, y = self.down_point.y, "double tap");
            listener.on_double_tap(self.down_point);
        }
    }

    fn handle_in_progress_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener) {
        match event.action {
            TouchAction::Move => {
                self.core.update(event);
                self.check_long_press(event, listener);
                self.track(event);
            }
            TouchAction::PointerDown => {
                // Multi-finger touches are never taps
                self.in_tap_region = false;
                self.last_tap = None;
            }
            TouchAction::PointerUp => {}
            TouchAction::Up => {
                self.core.update(event);
                self.check_long_press(event, listener);
                self.track(event);

                if self.in_tap_region && !self.long_pressed && !self.double_tapping {
                    listener.on_single_tap_up(self.down_point);
                    self.last_tap = Some(LastTap {
                        point: self.down_point,
                        up_time: event.event_time_ms,
                    });
                } else {
                    self.last_tap = None;
                }
                self.double_tapping = false;
                self.core.reset();
            }
            TouchAction::Cancel => {
                self.last_tap = None;
                self.double_tapping = false;
                self.core.reset();
            }
            TouchAction::Down => {
                // Missed an up; treat as a fresh start
                self.core.reset();
                self.handle_start_progress_event(event, listener);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::Pointer;

    #[derive(Default)]
    struct Recorder {
        taps: Vec<Point>,
        double_taps: Vec<Point>,
        long_presses: Vec<Point>,
    }

    impl TapListener for Recorder {
        fn on_single_tap_up(&mut self, point: Point) -> bool {
            self.taps.push(point);
            true
        }

        fn on_double_tap(&mut self, point: Point) -> bool {
            self.double_taps.push(point);
            true
        }

        fn on_long_press(&mut self, point: Point) {
            self.long_presses.push(point);
        }
    }

    fn one(action: TouchAction, time: u64, x: f32, y: f32) -> TouchEvent {
        TouchEvent::new(action, time, vec![Pointer::new(0, x, y)])
    }

    fn tap(d: &mut TapDetector, rec: &mut Recorder, time: u64, x: f32, y: f32) {
        d.on_touch_event(&one(TouchAction::Down, time, x, y), rec);
        d.on_touch_event(&one(TouchAction::Up, time + 50, x, y), rec);
    }

    #[test]
    fn quick_tap_reports_single_tap_up() {
        let mut d = TapDetector::new(&GestureConfig::default());
        let mut rec = Recorder::default();
        tap(&mut d, &mut rec, 0, 100.0, 100.0);
        assert_eq!(rec.taps, vec![Point::new(100.0, 100.0)]);
        assert!(!d.is_in_progress());
    }

    #[test]
    fn dragging_is_not_a_tap() {
        let mut d = TapDetector::new(&GestureConfig::default());
        let mut rec = Recorder::default();
        d.on_touch_event(&one(TouchAction::Down, 0, 100.0, 100.0), &mut rec);
        d.on_touch_event(&one(TouchAction::Move, 20, 140.0, 100.0), &mut rec);
        d.on_touch_event(&one(TouchAction::Up, 40, 140.0, 100.0), &mut rec);
        assert!(rec.taps.is_empty());
    }

    #[test]
    fn second_close_tap_is_double_tap() {
        let mut d = TapDetector::new(&GestureConfig::default());
        let mut rec = Recorder::default();
        tap(&mut d, &mut rec, 0, 100.0, 100.0);
        tap(&mut d, &mut rec, 150, 110.0, 105.0);
        assert_eq!(rec.taps.len(), 1);
        assert_eq!(rec.double_taps, vec![Point::new(110.0, 105.0)]);

        // A third tap starts a new sequence rather than another double tap
        tap(&mut d, &mut rec, 300, 110.0, 105.0);
        assert_eq!(rec.taps.len(), 2);
        assert_eq!(rec.double_taps.len(), 1);
    }

    #[test]
    fn late_second_tap_is_single() {
        let mut d = TapDetector::new(&GestureConfig::default());
        let mut rec = Recorder::default();
        tap(&mut d, &mut rec, 0, 100.0, 100.0);
        tap(&mut d, &mut rec, 1000, 100.0, 100.0);
        assert_eq!(rec.taps.len(), 2);
        assert!(rec.double_taps.is_empty());
    }

    #[test]
    fn held_pointer_reports_long_press_once() {
        let mut d = TapDetector::new(&GestureConfig::default());
        let mut rec = Recorder::default();
        d.on_touch_event(&one(TouchAction::Down, 0, 50.0, 60.0), &mut rec);
        d.on_touch_event(&one(TouchAction::Move, 200, 51.0, 60.0), &mut rec);
        assert!(rec.long_presses.is_empty());

        d.on_touch_event(&one(TouchAction::Move, 600, 51.0, 61.0), &mut rec);
        d.on_touch_event(&one(TouchAction::Move, 700, 51.0, 61.0), &mut rec);
        d.on_touch_event(&one(TouchAction::Up, 800, 51.0, 61.0), &mut rec);

        assert_eq!(rec.long_presses, vec![Point::new(50.0, 60.0)]);
        assert!(rec.taps.is_empty());
    }

    #[test]
    fn long_press_detected_on_up() {
        let mut d = TapDetector::new(&GestureConfig::default());
        let mut rec = Recorder::default();
        d.on_touch_event(&one(TouchAction::Down, 0, 50.0, 60.0), &mut rec);
        d.on_touch_event(&one(TouchAction::Up, 900, 50.0, 60.0), &mut rec);
        assert_eq!(rec.long_presses.len(), 1);
        assert!(rec.taps.is_empty());
    }

    #[test]
    fn second_pointer_cancels_tap() {
        let mut d = TapDetector::new(&GestureConfig::default());
        let mut rec = Recorder::default();
        d.on_touch_event(&one(TouchAction::Down, 0, 50.0, 60.0), &mut rec);
        d.on_touch_event(
            &TouchEvent::new(
                TouchAction::PointerDown,
                10,
                vec![Pointer::new(0, 50.0, 60.0), Pointer::new(1, 200.0, 60.0)],
            ),
            &mut rec,
        );
        d.on_touch_event(&one(TouchAction::Up, 40, 50.0, 60.0), &mut rec);
        assert!(rec.taps.is_empty());
    }
}

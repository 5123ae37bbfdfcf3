//! Two-finger pinch recognizer

use tracing::{debug, trace};

use crate::config::{GestureConfig, ScreenMetrics};
use crate::domain::core::Point;
use crate::input::detector::{DetectorCore, GestureDetector, GestureState};
use crate::input::event::{TouchAction, TouchEvent};
use crate::input::two_finger::TwoFingerState;

pub trait ScaleListener {
    fn on_scale_begin(&mut self, _detector: &ScaleDetector) -> bool {
        true
    }

    fn on_scale(&mut self, _detector: &ScaleDetector) -> bool {
        false
    }

    fn on_scale_end(&mut self, _detector: &ScaleDetector) {}
}

/// Reports the span ratio between the first two pointers
///
/// Begins as soon as a second pointer goes down; pinches near the screen
/// edge are not suppressed. Ends when a pointer lifts or on cancel.
#[derive(Debug, Clone)]
pub struct ScaleDetector {
    core: DetectorCore,
    fingers: TwoFingerState,
    focus: Point,
}

impl ScaleDetector {
    pub fn new(config: &GestureConfig, screen: ScreenMetrics) -> Self {
        Self {
            core: DetectorCore::new(config),
            fingers: TwoFingerState::new(config, screen),
            focus: Point::default(),
        }
    }

    pub fn set_screen_metrics(&mut self, screen: ScreenMetrics) {
        self.fingers.set_screen_metrics(screen);
    }

    /// `current span / previous span`, 1 when the previous span is zero
    pub fn scale_factor(&self) -> f32 {
        let prev = self.fingers.previous_span();
        if prev > 0.0 {
            self.fingers.current_span() / prev
        } else {
            1.0
        }
    }

    /// Midpoint of the two pointers in the current event
    pub fn focus(&self) -> Point {
        self.focus
    }

    pub fn current_span(&self) -> f32 {
        self.fingers.current_span()
    }

    pub fn previous_span(&self) -> f32 {
        self.fingers.previous_span()
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
        if let (Some(a), Some(b)) = (event.pointer(0), event.pointer(1)) {
            self.focus = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        }
        true
    }

    fn end(&mut self, listener: &mut dyn ScaleListener) {
        listener.on_scale_end(self);
        debug!("scale gesture ended");
        self.reset();
    }

    fn reset(&mut self) {
        self.core.reset();
        self.fingers.clear();
    }
}

impl GestureDetector for ScaleDetector {
    type Listener = dyn ScaleListener;

    fn state(&self) -> GestureState {
        self.core.state()
    }

    fn handle_start_progress_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener) {
        if event.action != TouchAction::PointerDown {
            return;
        }
        self.reset();
        self.core.start(event);
        if !self.update_state(event) {
            self.reset();
            return;
        }
        let begun = listener.on_scale_begin(self);
        self.core.set_in_progress(begun);
        if begun {
            debug!(span = self.current_span(), "scale gesture began");
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
                if self.core.pressure_accepted() {
                    trace!(factor = self.scale_factor(), "scale");
                    if listener.on_scale(self) {
                        self.core.accept_current();
                    }
                }
            }
            TouchAction::Down | TouchAction::PointerDown => {}
        }
    }
}

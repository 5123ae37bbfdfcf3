//! Two-finger rotation recognizer

use tracing::{debug, trace};

use crate::config::{GestureConfig, ScreenMetrics};
use crate::input::detector::{DetectorCore, GestureDetector, GestureState};
use crate::input::event::{TouchAction, TouchEvent};
use crate::input::two_finger::TwoFingerState;

pub trait RotateListener {
    fn on_rotate_begin(&mut self, _detector: &RotateDetector) -> bool {
        true
    }

    fn on_rotate(&mut self, _detector: &RotateDetector) -> bool {
        false
    }

    fn on_rotate_end(&mut self, _detector: &RotateDetector) {}
}

/// Reports the angle change of the vector between the first two pointers
///
/// Starts when a second pointer goes down, unless the gesture is sloppy; a
/// sloppy gesture is re-checked on every move and begins once it clears.
/// Ends when a pointer lifts or the stream is cancelled.
#[derive(Debug, Clone)]
pub struct RotateDetector {
    core: DetectorCore,
    fingers: TwoFingerState,
    sloppy: bool,
}

impl RotateDetector {
    pub fn new(config: &GestureConfig, screen: ScreenMetrics) -> Self {
        Self {
            core: DetectorCore::new(config),
            fingers: TwoFingerState::new(config, screen),
            sloppy: false,
        }
    }

    pub fn set_screen_metrics(&mut self, screen: ScreenMetrics) {
        self.fingers.set_screen_metrics(screen);
    }

    /// Rotation from the baseline to the current event, in degrees
    ///
    /// Positive when the finger vector turned counter-clockwise on a y-down
    /// screen.
    pub fn rotation_degrees_delta(&self) -> f32 {
        let (px, py) = self.fingers.previous_diff();
        let (cx, cy) = self.fingers.current_diff();
        (py.atan2(px) - cy.atan2(cx)).to_degrees()
    }

    pub fn current_span(&self) -> f32 {
        self.fingers.current_span()
    }

    pub fn time_delta(&self) -> u64 {
        self.core.time_delta()
    }

    fn update_state(&mut self, event: &TouchEvent) -> bool {
        if !self.core.update(event) {
            return false;
        }
        match self.core.previous() {
            Some(prev) => self.fingers.update(prev, event),
            None => false,
        }
    }

    fn begin(&mut self, listener: &mut dyn RotateListener) {
        let begun = listener.on_rotate_begin(self);
        self.core.set_in_progress(begun);
        if begun {
            debug!("rotate gesture began");
        }
    }

    fn end(&mut self, listener: &mut dyn RotateListener) {
        if !self.sloppy {
            listener.on_rotate_end(self);
            debug!("rotate gesture ended");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.core.reset();
        self.fingers.clear();
        self.sloppy = false;
    }
}

impl GestureDetector for RotateDetector {
    type Listener = dyn RotateListener;

    fn state(&self) -> GestureState {
        self.core.state()
    }

    fn handle_start_progress_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener) {
        match event.action {
            TouchAction::PointerDown => {
                self.reset();
                self.core.start(event);
                if !self.fingers.update(event, event) {
                    self.reset();
                    return;
                }
                self.sloppy = self.fingers.is_sloppy(event);
                if !self.sloppy {
                    self.begin(listener);
                }
            }
            TouchAction::Move => {
                if !self.sloppy || !self.update_state(event) {
                    return;
                }
                self.sloppy = self.fingers.is_sloppy(event);
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
                if self.core.pressure_accepted() {
                    trace!(degrees = self.rotation_degrees_delta(), "rotate");
                    if listener.on_rotate(self) {
                        self.core.accept_current();
                    }
                }
            }
            TouchAction::Down | TouchAction::PointerDown => {}
        }
    }
}

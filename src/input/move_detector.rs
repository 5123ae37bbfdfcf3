//! Single or multi-finger pan recognizer

use tracing::{debug, trace};

use crate::config::GestureConfig;
use crate::domain::core::Point;
use crate::input::detector::{DetectorCore, GestureDetector, GestureState};
use crate::input::event::{TouchAction, TouchEvent};

/// Receives pan callbacks
pub trait MoveListener {
    /// Returning true starts the gesture
    fn on_move_begin(&mut self, _detector: &MoveDetector) -> bool {
        true
    }

    /// Returning true makes the current event the new baseline
    fn on_move(&mut self, _detector: &MoveDetector) -> bool {
        false
    }

    fn on_move_end(&mut self, _detector: &MoveDetector) {}
}

/// Tracks the focal point (mean of all pointers) between events
///
/// Begins on the first move after a down and ends on up or cancel. When the
/// pointer count changes between two snapshots the focal point jumps, so
/// that delta is reported as zero instead. The external focus only ever
/// advances by reported deltas.
#[derive(Debug, Clone)]
pub struct MoveDetector {
    core: DetectorCore,
    focus_delta: Point,
    focus_external: Point,
}

impl MoveDetector {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            core: DetectorCore::new(config),
            focus_delta: Point::default(),
            focus_external: Point::default(),
        }
    }

    /// Focal point change between baseline and current event
    pub fn focus_delta(&self) -> Point {
        self.focus_delta
    }

    /// Accumulated focus, advanced only by reported deltas
    pub fn focus(&self) -> Point {
        self.focus_external
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

        self.focus_delta = if prev.pointer_count() != event.pointer_count() {
            Point::default()
        } else {
            match (event.focal_point(), prev.focal_point()) {
                (Some(curr), Some(prev)) => Point::new(curr.x - prev.x, curr.y - prev.y),
                _ => Point::default(),
            }
        };

        self.focus_external.x += self.focus_delta.x;
        self.focus_external.y += self.focus_delta.y;
        true
    }
}

impl GestureDetector for MoveDetector {
    type Listener = dyn MoveListener;

    fn state(&self) -> GestureState {
        self.core.state()
    }

    fn handle_start_progress_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener) {
        match event.action {
            TouchAction::Down => {
                self.core.start(event);
                self.update_state(event);
            }
            TouchAction::Move => {
                if self.core.previous().is_none() {
                    return;
                }
                let begun = listener.on_move_begin(self);
                self.core.set_in_progress(begun);
                if begun {
                    debug!(pointers = event.pointer_count(), "move gesture began");
                }
            }
            _ => {}
        }
    }

    fn handle_in_progress_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener) {
        match event.action {
            TouchAction::Up | TouchAction::Cancel => {
                listener.on_move_end(self);
                self.core.reset();
                debug!("move gesture ended");
            }
            TouchAction::Move => {
                if !self.update_state(event) {
                    return;
                }
                if self.core.pressure_accepted() {
                    trace!(dx = self.focus_delta.x, dy = self.focus_delta.y, "move");
                    if listener.on_move(self) {
                        self.core.accept_current();
                    }
                }
            }
            _ => {}
        }
    }
}

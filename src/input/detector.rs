//! Shared gesture state machine
//!
//! Every recognizer is a two-state machine. While idle it looks for the
//! event that starts its gesture; while in progress it feeds updates to its
//! listener until a terminal event resets it. [`DetectorCore`] keeps the
//! event snapshots and pressure values all recognizers need.

use crate::config::GestureConfig;
use crate::input::event::TouchEvent;

/// Recognizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    InProgress,
}

/// Common interface of all recognizers
///
/// Listeners are passed per call so the host can route callbacks into
/// state it owns.
pub trait GestureDetector {
    type Listener: ?Sized;

    fn state(&self) -> GestureState;

    /// Handles an event while no gesture is in progress; may start one
    fn handle_start_progress_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener);

    /// Handles an event while a gesture is in progress; may end it
    fn handle_in_progress_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener);

    fn is_in_progress(&self) -> bool {
        self.state() == GestureState::InProgress
    }

    /// Entry point for every touch event
    ///
    /// # Returns
    /// Always true: the event was consumed
    fn on_touch_event(&mut self, event: &TouchEvent, listener: &mut Self::Listener) -> bool {
        match self.state() {
            GestureState::Idle => self.handle_start_progress_event(event, listener),
            GestureState::InProgress => self.handle_in_progress_event(event, listener),
        }
        true
    }
}

/// Event snapshots and pressure bookkeeping shared by every recognizer
#[derive(Debug, Clone, Default)]
pub struct DetectorCore {
    state: GestureState,
    prev: Option<TouchEvent>,
    curr: Option<TouchEvent>,
    prev_pressure: f32,
    curr_pressure: f32,
    time_delta: u64,
    pressure_threshold: f32,
}

impl DetectorCore {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            pressure_threshold: config.pressure_threshold,
            ..Self::default()
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn set_in_progress(&mut self, in_progress: bool) {
        self.state = if in_progress {
            GestureState::InProgress
        } else {
            GestureState::Idle
        };
    }

    /// Starts tracking from this event, dropping anything left over from a
    /// missed terminal event
    pub fn start(&mut self, event: &TouchEvent) {
        self.reset();
        self.prev = Some(event.clone());
        self.time_delta = 0;
        self.update(event);
    }

    /// Makes the event current and refreshes time delta and pressures
    ///
    /// # Returns
    /// false if there is no previous snapshot to compare against
    pub fn update(&mut self, event: &TouchEvent) -> bool {
        let Some(prev) = &self.prev else {
            return false;
        };
        self.time_delta = event.event_time_ms.saturating_sub(prev.event_time_ms);
        self.prev_pressure = prev.action_pressure();
        self.curr_pressure = event.action_pressure();
        self.curr = Some(event.clone());
        true
    }

    /// Makes the current event the new comparison baseline
    pub fn accept_current(&mut self) {
        if let Some(curr) = &self.curr {
            self.prev = Some(curr.clone());
        }
    }

    /// Drops both snapshots and returns to idle
    pub fn reset(&mut self) {
        self.prev = None;
        self.curr = None;
        self.state = GestureState::Idle;
    }

    /// Filters frames where pressure drops sharply, which usually means a
    /// finger is lifting and its position is unreliable
    ///
    /// A non-positive previous pressure gives no usable ratio; such frames
    /// are accepted.
    pub fn pressure_accepted(&self) -> bool {
        if self.prev_pressure <= 0.0 {
            return true;
        }
        self.curr_pressure / self.prev_pressure > self.pressure_threshold
    }

    pub fn previous(&self) -> Option<&TouchEvent> {
        self.prev.as_ref()
    }

    pub fn current(&self) -> Option<&TouchEvent> {
        self.curr.as_ref()
    }

    /// Milliseconds between the baseline event and the current one
    pub fn time_delta(&self) -> u64 {
        self.time_delta
    }

    /// Time of the current event, 0 when idle
    pub fn event_time(&self) -> u64 {
        self.curr.as_ref().map_or(0, |e| e.event_time_ms)
    }

    pub fn previous_pressure(&self) -> f32 {
        self.prev_pressure
    }

    pub fn current_pressure(&self) -> f32 {
        self.curr_pressure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::{Pointer, TouchAction};

    fn event(time: u64, pressure: f32) -> TouchEvent {
        TouchEvent::new(
            TouchAction::Move,
            time,
            vec![Pointer::new(0, 0.0, 0.0).with_pressure(pressure)],
        )
    }

    #[test]
    fn start_tracks_time_and_pressure() {
        let mut core = DetectorCore::new(&GestureConfig::default());
        core.start(&event(100, 1.0));
        assert_eq!(core.time_delta(), 0);

        assert!(core.update(&event(130, 0.9)));
        assert_eq!(core.time_delta(), 30);
        assert_eq!(core.previous_pressure(), 1.0);
        assert_eq!(core.current_pressure(), 0.9);
        assert_eq!(core.event_time(), 130);
    }

    #[test]
    fn pressure_filter_threshold() {
        let mut core = DetectorCore::new(&GestureConfig::default());
        core.start(&event(0, 1.0));

        core.update(&event(10, 0.5));
        assert!(!core.pressure_accepted());

        core.update(&event(20, 0.9));
        assert!(core.pressure_accepted());
    }

    #[test]
    fn zero_previous_pressure_is_accepted() {
        let mut core = DetectorCore::new(&GestureConfig::default());
        core.start(&event(0, 0.0));
        core.update(&event(10, 0.2));
        assert!(core.pressure_accepted());
    }

    #[test]
    fn update_without_start_is_rejected() {
        let mut core = DetectorCore::new(&GestureConfig::default());
        assert!(!core.update(&event(10, 1.0)));
        assert!(core.current().is_none());
    }

    #[test]
    fn accept_current_moves_baseline() {
        let mut core = DetectorCore::new(&GestureConfig::default());
        core.start(&event(0, 1.0));
        core.update(&event(40, 1.0));
        core.accept_current();
        core.update(&event(50, 1.0));
        assert_eq!(core.time_delta(), 10);

        core.set_in_progress(true);
        core.reset();
        assert_eq!(core.state(), GestureState::Idle);
        assert!(core.previous().is_none());
    }
}

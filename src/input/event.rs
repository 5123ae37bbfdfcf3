//! Touch event model
//!
//! Events are plain values handed in by the host. Pointer positions are
//! local to the host view; the raw offset is the view's position on screen
//! and turns local coordinates into screen coordinates.

use serde::{Deserialize, Serialize};

use crate::domain::core::Point;

/// What happened in a touch event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TouchAction {
    /// First pointer touched down
    Down,
    /// An additional pointer touched down
    PointerDown,
    Move,
    /// A non-last pointer lifted; the event still carries it
    PointerUp,
    /// Last pointer lifted
    Up,
    Cancel,
}

/// One pointer within a touch event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
}

impl Pointer {
    /// Creates a pointer with full pressure
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            pressure: 1.0,
        }
    }

    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = pressure;
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A single touch event with every active pointer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub action: TouchAction,
    /// Index of the pointer that went down or up
    pub action_index: usize,
    pub pointers: Vec<Pointer>,
    pub event_time_ms: u64,
    pub raw_offset_x: f32,
    pub raw_offset_y: f32,
}

impl TouchEvent {
    /// Creates an event with no raw offset and the first pointer as the
    /// action pointer
    pub fn new(action: TouchAction, event_time_ms: u64, pointers: Vec<Pointer>) -> Self {
        Self {
            action,
            action_index: 0,
            pointers,
            event_time_ms,
            raw_offset_x: 0.0,
            raw_offset_y: 0.0,
        }
    }

    pub fn with_action_index(mut self, action_index: usize) -> Self {
        self.action_index = action_index;
        self
    }

    pub fn with_raw_offset(mut self, x: f32, y: f32) -> Self {
        self.raw_offset_x = x;
        self.raw_offset_y = y;
        self
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    pub fn pointer(&self, index: usize) -> Option<&Pointer> {
        self.pointers.get(index)
    }

    /// Pressure of the action pointer, 0 if it is missing
    pub fn action_pressure(&self) -> f32 {
        self.pointers
            .get(self.action_index)
            .or_else(|| self.pointers.first())
            .map_or(0.0, |p| p.pressure)
    }

    /// Screen position of a pointer
    pub fn raw_position(&self, index: usize) -> Option<Point> {
        self.pointers
            .get(index)
            .map(|p| Point::new(p.x + self.raw_offset_x, p.y + self.raw_offset_y))
    }

    /// Mean position of all pointers, None for an empty event
    pub fn focal_point(&self) -> Option<Point> {
        if self.pointers.is_empty() {
            return None;
        }
        let count = self.pointers.len() as f32;
        let (sx, sy) = self
            .pointers
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point::new(sx / count, sy / count))
    }
}

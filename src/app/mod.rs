//! Application layer
//!
//! The composition manager owns the scene; the motion controller turns raw
//! touch events into edits of the selected entity.

pub mod composition;
pub mod controller;

pub use composition::{Composition, CompositionError, CompositionEvent};
pub use controller::MotionController;

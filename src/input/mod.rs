//! Touch input and gesture recognition
//!
//! Raw touch events go in; move, rotate, shove, scale and tap signals come
//! out through listener traits. Recognizers share no state with each other.

pub mod detector;
pub mod event;
pub mod move_detector;
pub mod rotate;
pub mod scale;
pub mod shove;
pub mod tap;
pub mod two_finger;

pub use detector::{GestureDetector, GestureState};
pub use event::{Pointer, TouchAction, TouchEvent};
pub use move_detector::{MoveDetector, MoveListener};
pub use rotate::{RotateDetector, RotateListener};
pub use scale::{ScaleDetector, ScaleListener};
pub use shove::{ShoveDetector, ShoveListener};
pub use tap::{TapDetector, TapListener};

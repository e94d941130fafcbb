//! Marker position animation
//!
//! Easing curves, antimeridian-aware interpolation, and the per-frame
//! animator the marker scheduler drives on its looper.

pub mod animator;
pub mod interpolation;

pub use animator::{AnimationTask, Animator};
pub use interpolation::{EasingFunction, Interpolation};

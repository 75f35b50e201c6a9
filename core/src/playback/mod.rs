//! Lock-step playback of every trajectory in a level.
//!
//! The scheduler owns the shared clock. Each call to
//! [`PlaybackScheduler::advance`] processes one `(major, sub)` tick and
//! reports, per player still on course, where to draw them or that they
//! just finished.

mod geometry;
mod scheduler;
mod spline;

pub use geometry::{LevelGeometry, interpolate_raw, interpolate_screen};
pub use scheduler::{PlaybackScheduler, PlayerTick, Quality, RenderState, TickOutput};
pub use spline::{CubicSpline, VelocitySpline};

#[cfg(test)]
mod tests;

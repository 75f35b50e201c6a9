//! Replay space to canvas space.

use crate::replay::{ReplayFrame, Trajectory};
use ghostreel_shared::constants::{LEVEL_OFFSET_X, LEVEL_OFFSET_Y, OVERWORLD_TOP, SUBWORLD_TOP};
use glam::Vec2;

/// Placement of the level images on the canvas. Heights are already scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelGeometry {
    pub scale: u32,
    pub overworld_height: u32,
    pub subworld_height: Option<u32>,
}

impl LevelGeometry {
    pub fn new(scale: u32, overworld_height: u32, subworld_height: Option<u32>) -> Self {
        Self {
            scale,
            overworld_height,
            subworld_height,
        }
    }

    /// Canvas y of the overworld image's top edge.
    pub fn overworld_top(&self) -> u32 {
        OVERWORLD_TOP * self.scale
    }

    /// Canvas y of the subworld image's top edge.
    pub fn subworld_top(&self) -> u32 {
        self.overworld_height + SUBWORLD_TOP * self.scale
    }

    /// Total height taken by the level images and their margins.
    pub fn levels_height(&self) -> u32 {
        match self.subworld_height {
            Some(sub) => self.overworld_height + sub + 480 * self.scale,
            None => self.overworld_height + 240 * self.scale,
        }
    }

    /// Map a fixed-point replay position into canvas pixels.
    pub fn to_screen(&self, x: u16, y: u16, subworld: bool) -> Vec2 {
        let s = self.scale as f32;
        let sx = (x as f32 / 16.0 - LEVEL_OFFSET_X) * s;
        let dy = (y as f32 / 16.0 - LEVEL_OFFSET_Y) * s;
        let sy = if subworld {
            self.subworld_height.unwrap_or(0) as f32 - dy + self.subworld_top() as f32
        } else {
            self.overworld_height as f32 - dy + self.overworld_top() as f32
        };
        Vec2::new(sx, sy)
    }

    /// Map a frame using the space its own flags declare.
    pub fn frame_to_screen(&self, frame: &ReplayFrame) -> Vec2 {
        self.to_screen(frame.x, frame.y, frame.in_subworld())
    }
}

/// Interpolated position in raw replay units.
pub fn interpolate_raw(trajectory: &Trajectory, major: usize, sub: u32, subframes: u32) -> Vec2 {
    let raw = |f: &ReplayFrame| Vec2::new(f.x as f32, f.y as f32);
    let before = raw(&trajectory[major]);
    match trajectory.get(major + 1) {
        Some(after) => before.lerp(raw(after), sub as f32 / subframes as f32),
        None => before,
    }
}

/// Interpolated canvas position. Each endpoint is mapped in its own
/// frame's space before blending, so a space switch does not snap.
pub fn interpolate_screen(
    geometry: &LevelGeometry,
    trajectory: &Trajectory,
    major: usize,
    sub: u32,
    subframes: u32,
) -> Vec2 {
    let before = geometry.frame_to_screen(&trajectory[major]);
    match trajectory.get(major + 1) {
        Some(after) => before.lerp(
            geometry.frame_to_screen(after),
            sub as f32 / subframes as f32,
        ),
        None => before,
    }
}

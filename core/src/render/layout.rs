//! Canvas geometry of every panel and decoration, derived from the level
//! images and the scale factor.

use crate::playback::LevelGeometry;
use ghostreel_shared::constants::{
    COUNTRY_BAR_SLOT, COUNTRY_BAR_WIDTH, COUNTRY_CHART_HEIGHT, LEADERBOARD_HEIGHT,
    LEADERBOARD_ROW_PITCH, LEADERBOARD_WIDTH, LEADERBOARD_X,
};
use glam::Vec2;

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub geometry: LevelGeometry,
    pub width: u32,
    pub height: u32,
    /// Chroma-key panel behind the leaderboard.
    pub leaderboard: Rect,
    /// Chroma-key panel under the level, holding the country chart.
    pub chart: Rect,
}

impl Layout {
    pub fn new(geometry: LevelGeometry) -> Self {
        let s = geometry.scale;
        let levels_height = geometry.levels_height();
        let width = (LEADERBOARD_X + LEADERBOARD_WIDTH) * s;
        let chart_height = COUNTRY_CHART_HEIGHT * s;
        let height = (levels_height + chart_height).max(LEADERBOARD_HEIGHT * s);

        Self {
            geometry,
            width,
            height,
            leaderboard: Rect::new(
                (LEADERBOARD_X * s) as i32,
                0,
                LEADERBOARD_WIDTH * s,
                LEADERBOARD_HEIGHT * s,
            ),
            chart: Rect::new(0, levels_height as i32, width, chart_height),
        }
    }

    pub fn scale(&self) -> u32 {
        self.geometry.scale
    }

    /// `v` scaled, as a signed pixel offset.
    pub fn px(&self, v: u32) -> i32 {
        (v * self.geometry.scale) as i32
    }

    pub fn overworld_origin(&self) -> (i32, i32) {
        (0, self.geometry.overworld_top() as i32)
    }

    pub fn subworld_origin(&self) -> (i32, i32) {
        (0, self.geometry.subworld_top() as i32)
    }

    /// Baseline of leaderboard row `row` (0-based).
    pub fn row_baseline(&self, row: usize) -> i32 {
        (row as i32 + 1) * self.px(LEADERBOARD_ROW_PITCH)
    }

    /// Top edge of the avatar and flag thumbnails on a row.
    pub fn row_thumbnail_top(&self, row: usize) -> i32 {
        self.row_baseline(row) - self.px(40)
    }

    pub fn rank_x(&self) -> i32 {
        self.leaderboard.x + self.px(8)
    }

    pub fn avatar_x(&self) -> i32 {
        self.leaderboard.x + self.px(176)
    }

    pub fn flag_x(&self) -> i32 {
        self.leaderboard.x + self.px(236)
    }

    pub fn name_x(&self) -> i32 {
        self.leaderboard.x + self.px(316)
    }

    /// Baseline origin of the playback clock.
    pub fn timer_origin(&self) -> (i32, i32) {
        let x = self.leaderboard.x - (self.leaderboard.w as i32) - self.px(250);
        (x, self.chart.y + self.px(400))
    }

    /// Left edge of country bar slot `index`.
    pub fn bar_slot_x(&self, index: usize) -> i32 {
        index as i32 * self.px(COUNTRY_BAR_SLOT)
    }

    /// Bar for a country with `count` finishers when the leader has `max`.
    pub fn bar_rect(&self, index: usize, count: u32, max: u32) -> Rect {
        let total = self.chart.h.saturating_sub(45);
        let height = if max == 0 {
            0
        } else {
            (total as u64 * count as u64 / max as u64) as u32
        };
        Rect::new(
            self.bar_slot_x(index) + self.px(9),
            self.chart.y + total as i32 - height as i32,
            COUNTRY_BAR_WIDTH * self.scale(),
            height,
        )
    }

    /// Top-left of the flag under bar `index`.
    pub fn bar_flag_origin(&self, index: usize) -> (i32, i32) {
        (
            self.bar_slot_x(index) + self.px(9),
            self.chart.y + self.chart.h as i32 - self.px(24),
        )
    }

    /// Baseline origin of the count label for bar `index`.
    pub fn bar_label_origin(&self, index: usize) -> (i32, i32) {
        (
            self.bar_slot_x(index) + self.px(7),
            self.chart.y + self.chart.h as i32 - self.px(30),
        )
    }

    /// Top-left of an upright `w`x`h` sprite for a player at `screen`.
    pub fn sprite_origin(&self, screen: Vec2, w: u32, h: u32) -> (i32, i32) {
        let (x, y) = (screen.x as i32, screen.y as i32);
        let (w, h) = (w as i32, h as i32);
        (x + 16 - w / 2, y + 16 - h / 2 - h)
    }

    /// Rotation centre of a sprite `h` pixels tall for a player at `screen`.
    pub fn rotation_centre(&self, screen: Vec2, h: u32) -> Vec2 {
        let (x, y) = (screen.x as i32, screen.y as i32);
        Vec2::new((x + 16) as f32, (y + 16 - h as i32 / 2) as f32)
    }

    /// Baseline origin of a player's floating name.
    pub fn name_label_origin(&self, screen: Vec2) -> (i32, i32) {
        (screen.x as i32 + 16, screen.y as i32 - 4)
    }

    /// Canvas point a heat-line passes through for a player at `screen`.
    pub fn trail_point(&self, screen: Vec2) -> Vec2 {
        let offset = self.px(8) as f32;
        Vec2::new(screen.x.trunc() + offset, screen.y.trunc() - offset)
    }

    /// Heat-line legend: colour ramp area inside the chart panel.
    pub fn legend_ramp(&self) -> Rect {
        let height = (self.chart.h as f64 * 0.95) as u32;
        Rect::new(0, self.chart.y + self.px(10), self.px(54) as u32, height)
    }
}

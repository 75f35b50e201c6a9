//! Trajectory trails coloured by finish time.
//!
//! Slow runs are drawn red, fast runs green, with an exponent per level
//! that decides how quickly the ramp moves away from red. The fastest few
//! get a reserved blue so they stand out from the bulk.

use super::layout::{Layout, Rect};
use super::{BLACK, DrawTarget, WHITE, hsv, rgb};
use crate::playback::{PlayerTick, TickOutput, interpolate_screen};
use crate::store::{PlayerId, TrajectoryStore};
use ghostreel_shared::constants::TOP_RUN_RGB;
use ghostreel_shared::format_race_time;
use glam::Vec2;
use image::Rgba;

/// Legend labels are placed every this many ramp rows.
const LEGEND_LABEL_STEP: u32 = 25;

/// Heat colour for a run at finish percentile `p` (0 = fastest).
pub fn heat_colour(p: f64, exponent: f64) -> Rgba<u8> {
    let ramp = (1.0 - p.clamp(0.0, 1.0)).powf(1.0 / exponent - 1.0);
    hsv((15.0 + ramp * 95.0) as f32, 1.0, 0.75)
}

/// Per-player trail colours for one level.
#[derive(Debug, Clone)]
pub struct HeatLines {
    colours: Vec<Rgba<u8>>,
    best: u64,
    worst: u64,
    exponent: f64,
    top_highlight: usize,
}

impl HeatLines {
    pub fn new(store: &TrajectoryStore, exponent: f64, top_highlight: usize) -> Self {
        let best = store.best_time().unwrap_or(0);
        let worst = store.worst_time().unwrap_or(0);
        let range = worst.saturating_sub(best);

        let mut colours: Vec<Rgba<u8>> = store
            .players()
            .iter()
            .map(|meta| {
                let p = if range == 0 {
                    0.0
                } else {
                    (meta.finish_time_ms - best) as f64 / range as f64
                };
                heat_colour(p, exponent)
            })
            .collect();

        let mut by_time: Vec<PlayerId> = store.ids().collect();
        by_time.sort_by_key(|&id| store.player(id).finish_time_ms);
        for &id in by_time.iter().take(top_highlight) {
            colours[id] = rgb(TOP_RUN_RGB);
        }

        Self {
            colours,
            best,
            worst,
            exponent,
            top_highlight,
        }
    }

    pub fn colour(&self, id: PlayerId) -> Rgba<u8> {
        self.colours[id]
    }

    /// Trails for players still on course at this tick.
    pub fn draw_trails<T: DrawTarget + ?Sized>(
        &self,
        target: &mut T,
        layout: &Layout,
        store: &TrajectoryStore,
        tick: &TickOutput,
    ) {
        let subframes = tick.subframes.max(1);
        for (id, state) in &tick.players {
            let id = *id;
            if matches!(state, PlayerTick::Finished) {
                continue;
            }
            let trajectory = store.trajectory(id);
            if tick.major + 1 >= trajectory.len() {
                continue;
            }

            // The opening frame shows every full path once.
            let segments = if tick.major == 0 && tick.sub == 0 {
                trajectory.len() - 1
            } else {
                tick.major
            };
            self.draw_segments(target, layout, store, id, segments);

            let head_start = layout.geometry.frame_to_screen(&trajectory[tick.major]);
            let head = interpolate_screen(&layout.geometry, trajectory, tick.major, tick.sub, subframes);
            target.line(
                layout.trail_point(head_start),
                layout.trail_point(head),
                self.colours[id],
            );
        }
    }

    /// Every player's complete trail.
    pub fn draw_all<T: DrawTarget + ?Sized>(
        &self,
        target: &mut T,
        layout: &Layout,
        store: &TrajectoryStore,
    ) {
        for id in store.ids() {
            let segments = store.trajectory(id).len().saturating_sub(1);
            self.draw_segments(target, layout, store, id, segments);
        }
    }

    /// Lines between frames `i` and `i + 1` for `i < segments`, skipping
    /// any that touch a transition frame.
    fn draw_segments<T: DrawTarget + ?Sized>(
        &self,
        target: &mut T,
        layout: &Layout,
        store: &TrajectoryStore,
        id: PlayerId,
        segments: usize,
    ) {
        let frames = store.trajectory(id).frames();
        for pair in frames.windows(2).take(segments) {
            if pair[0].is_transition() || pair[1].is_transition() {
                continue;
            }
            let from = layout.trail_point(layout.geometry.frame_to_screen(&pair[0]));
            let to = layout.trail_point(layout.geometry.frame_to_screen(&pair[1]));
            target.line(from, to, self.colours[id]);
        }
    }

    /// Colour ramp with finish-time labels, in the chart panel.
    pub fn draw_legend<T: DrawTarget + ?Sized>(
        &self,
        target: &mut T,
        layout: &Layout,
        players: usize,
    ) {
        let ramp = layout.legend_ramp();
        let margin = layout.px(10);
        target.fill_rect(
            Rect::new(
                ramp.x - margin,
                ramp.y - margin,
                ramp.w + layout.px(80) as u32,
                ramp.h + layout.px(20) as u32,
            ),
            BLACK,
        );

        let range = self.worst.saturating_sub(self.best) as f64;
        let inverse = -self.exponent / (self.exponent - 1.0);
        let label_size = layout.px(10) as u32;
        let top = rgb(TOP_RUN_RGB);
        let left = ramp.x as f32;
        let right = (ramp.x + ramp.w as i32) as f32;

        for i in 0..ramp.h {
            let p = i as f64 / ramp.h as f64;
            let colour = if players as f64 * p > self.top_highlight as f64 {
                hsv((15.0 + (1.0 - p) * 95.0) as f32, 1.0, 0.75)
            } else {
                top
            };
            let y = (ramp.y + i as i32) as f32;
            target.line(Vec2::new(left, y), Vec2::new(right, y), colour);

            if i % LEGEND_LABEL_STEP == 0 {
                let time = (1.0 - (1.0 - p).powf(inverse)) * range + self.best as f64;
                target.text(
                    ramp.x + ramp.w as i32 + layout.px(5),
                    ramp.y + i as i32 + margin,
                    &format_race_time(time.max(0.0) as u64),
                    label_size,
                    WHITE,
                );
                target.line(
                    Vec2::new(right, y),
                    Vec2::new(right + layout.px(3) as f32, y),
                    WHITE,
                );
            }
        }
    }
}

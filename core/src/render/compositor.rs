//! Per-frame draw-call sequence.

use super::heatline::HeatLines;
use super::layout::Layout;
use super::{BLACK, DrawTarget, WHITE, rgb};
use crate::assets::LevelAssets;
use crate::config::LayerSet;
use crate::leaderboard::LeaderboardTracker;
use crate::playback::{RenderState, TickOutput};
use crate::store::{PlayerId, TrajectoryStore};
use ghostreel_shared::constants::CHROMA_KEY_RGB;
use ghostreel_shared::format_race_time;
use image::Rgba;
use tracing::trace;

/// Name labels float over the level semi-transparent.
const NAME_LABEL: Rgba<u8> = Rgba([255, 255, 255, 150]);

/// Read-only view of the session state for one frame.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub store: &'a TrajectoryStore,
    pub tracker: &'a LeaderboardTracker,
    pub tick: &'a TickOutput,
}

/// Draws frames for one level.
///
/// Draw order, back to front: backgrounds, chroma-key panels, leaderboard,
/// country chart, heat-lines, sprites, timer, name labels.
pub struct Compositor {
    assets: LevelAssets,
    layout: Layout,
    layers: LayerSet,
    rows: usize,
    heat: HeatLines,
}

impl Compositor {
    pub fn new(
        assets: LevelAssets,
        heat: HeatLines,
        scale: u32,
        layers: LayerSet,
        rows: usize,
    ) -> Self {
        let layout = Layout::new(assets.geometry(scale));
        Self {
            assets,
            layout,
            layers,
            rows,
            heat,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn layers(&self) -> LayerSet {
        self.layers
    }

    pub fn compose<T: DrawTarget + ?Sized>(&self, target: &mut T, frame: &FrameContext<'_>) {
        self.draw_base(target);
        self.draw_leaderboard(target, frame);
        self.draw_country_chart(target, frame.tracker);

        if self.layers.contains(LayerSet::HEAT_LINES) {
            self.heat
                .draw_trails(target, &self.layout, frame.store, frame.tick);
            self.heat
                .draw_legend(target, &self.layout, frame.store.len());
        }
        if self.layers.contains(LayerSet::SPRITES) {
            for (id, state) in frame.tick.visible() {
                self.draw_sprite(target, frame.store, id, state);
            }
        }
        if self.layers.contains(LayerSet::TIMER) {
            let (x, y) = self.layout.timer_origin();
            target.text(
                x,
                y,
                &format_race_time(frame.tick.elapsed_ms),
                self.layout.px(180) as u32,
                WHITE,
            );
        }
        if self.layers.contains(LayerSet::NAMES) {
            let size = self.layout.px(10) as u32;
            for (id, state) in frame.tick.visible() {
                let (x, y) = self.layout.name_label_origin(state.screen);
                target.text(x, y, &frame.store.player(id).name, size, NAME_LABEL);
            }
        }
    }

    /// Still image of the level with every complete trail.
    pub fn compose_overview<T: DrawTarget + ?Sized>(
        &self,
        target: &mut T,
        store: &TrajectoryStore,
    ) {
        self.draw_base(target);
        self.heat.draw_all(target, &self.layout, store);
        self.heat.draw_legend(target, &self.layout, store.len());
    }

    fn draw_base<T: DrawTarget + ?Sized>(&self, target: &mut T) {
        target.clear(BLACK);

        let (x, y) = self.layout.overworld_origin();
        target.blit(&self.assets.overworld, x, y);
        if let Some(subworld) = &self.assets.subworld {
            let (x, y) = self.layout.subworld_origin();
            target.blit(subworld, x, y);
        }

        let chroma = rgb(CHROMA_KEY_RGB);
        target.fill_rect(self.layout.leaderboard, chroma);
        target.fill_rect(self.layout.chart, chroma);
    }

    fn draw_leaderboard<T: DrawTarget + ?Sized>(&self, target: &mut T, frame: &FrameContext<'_>) {
        let rank_size = self.layout.px(40) as u32;
        let name_size = self.layout.px(30) as u32;

        for (row, (rank, id)) in frame.tracker.visible(self.rows).into_iter().enumerate() {
            let player = frame.store.player(id);
            let baseline = self.layout.row_baseline(row);
            let top = self.layout.row_thumbnail_top(row);

            target.text(self.layout.rank_x(), baseline, &rank.to_string(), rank_size, WHITE);
            if let Some(avatar) = &player.avatar {
                target.blit(avatar, self.layout.avatar_x(), top);
            }
            if let Some(flag) = player.country.and_then(|c| self.assets.flag(c)) {
                target.blit(flag, self.layout.flag_x(), top);
            }
            target.text(self.layout.name_x(), baseline, &player.name, name_size, WHITE);
        }
    }

    fn draw_country_chart<T: DrawTarget + ?Sized>(
        &self,
        target: &mut T,
        tracker: &LeaderboardTracker,
    ) {
        let max = tracker.tally().max_count();
        let label_size = self.layout.px(20) as u32;

        for (index, (country, count)) in tracker.tally_sorted().into_iter().enumerate() {
            let bar = self.layout.bar_rect(index, count, max);
            if bar.x >= self.layout.width as i32 {
                break;
            }
            target.fill_rect(bar, WHITE);
            if let Some(flag) = self.assets.flag(country) {
                let (x, y) = self.layout.bar_flag_origin(index);
                target.blit(flag, x, y);
            }
            let (x, y) = self.layout.bar_label_origin(index);
            target.text(x, y, &count.to_string(), label_size, WHITE);
        }
    }

    fn draw_sprite<T: DrawTarget + ?Sized>(
        &self,
        target: &mut T,
        store: &TrajectoryStore,
        id: PlayerId,
        state: &RenderState,
    ) {
        let character = store.player(id).character;
        let Some(sprite) = self.assets.sprite(character, state.sprite_state) else {
            trace!("No sprite for {:?} state {}", character, state.sprite_state);
            return;
        };

        match state.rotation {
            Some(angle) => {
                let centre = self.layout.rotation_centre(state.screen, sprite.plain.height());
                target.blit_rotated(&sprite.plain, centre, angle);
            }
            None => {
                let image = sprite.image(state.facing);
                let (x, y) = self
                    .layout
                    .sprite_origin(state.screen, image.width(), image.height());
                target.blit(image, x, y);
            }
        }
    }
}

//! The playback clock.

use super::geometry::{LevelGeometry, interpolate_screen};
use super::spline::VelocitySpline;
use crate::replay::Trajectory;
use crate::store::{PlayerId, TrajectoryStore};
use ghostreel_shared::Gamestyle;
use ghostreel_shared::constants::SAMPLES_PER_SECOND;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Interpolation density between recorded samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// 4 output frames per sample.
    Standard,
    /// 8 output frames per sample.
    #[default]
    Smooth,
}

impl Quality {
    pub fn subframes(self) -> u32 {
        match self {
            Quality::Standard => 4,
            Quality::Smooth => 8,
        }
    }
}

/// Where and how to draw one player this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    /// Canvas position of the sprite's reference point.
    pub screen: Vec2,
    pub sprite_state: u8,
    /// Mirror the sprite horizontally.
    pub facing: bool,
    /// Drawn in the subworld.
    pub world_space: bool,
    /// Radians, for states drawn rotated instead of mirrored.
    pub rotation: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerTick {
    Visible(RenderState),
    /// In a pipe or door transition; nothing to draw.
    Suppressed,
    /// Trajectory exhausted on this tick. The leaderboard must pop once.
    Finished,
}

/// Everything the compositor needs from one tick.
#[derive(Debug, Clone, Default)]
pub struct TickOutput {
    pub major: usize,
    pub sub: u32,
    /// Sub-frames per sample the tick was produced with.
    pub subframes: u32,
    pub elapsed_ms: u64,
    /// Players still on course at this tick, in id order.
    pub players: Vec<(PlayerId, PlayerTick)>,
    /// No player remains after this tick.
    pub done: bool,
}

impl TickOutput {
    pub fn finished(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players
            .iter()
            .filter(|(_, tick)| matches!(tick, PlayerTick::Finished))
            .map(|(id, _)| *id)
    }

    pub fn visible(&self) -> impl Iterator<Item = (PlayerId, &RenderState)> + '_ {
        self.players.iter().filter_map(|(id, tick)| match tick {
            PlayerTick::Visible(state) => Some((*id, state)),
            _ => None,
        })
    }
}

/// Shared playback clock and per-player cursor state for one level.
///
/// The scheduler does not own trajectories; every call takes the store it
/// was built from.
#[derive(Debug)]
pub struct PlaybackScheduler {
    geometry: LevelGeometry,
    subframes: u32,
    rotating_states: &'static [u8],
    major: usize,
    sub: u32,
    facing: Vec<bool>,
    world_space: Vec<bool>,
    active: Vec<bool>,
    active_count: usize,
    splines: Vec<Option<VelocitySpline>>,
}

impl PlaybackScheduler {
    /// Set up the cursor and fit rotation splines for players that need them.
    pub fn new(
        store: &TrajectoryStore,
        geometry: LevelGeometry,
        gamestyle: Gamestyle,
        subframes: u32,
    ) -> Self {
        assert!(subframes > 0, "subframes must be positive");
        let rotating_states = gamestyle.rotating_states();

        let active: Vec<bool> = store.trajectories().iter().map(|t| !t.is_empty()).collect();
        let active_count = active.iter().filter(|&&a| a).count();

        let splines = store
            .trajectories()
            .iter()
            .map(|trajectory| {
                let rotates = trajectory
                    .iter()
                    .any(|f| rotating_states.contains(&f.state));
                if rotates {
                    VelocitySpline::fit(trajectory, subframes)
                } else {
                    None
                }
            })
            .collect();

        let world_space = store
            .trajectories()
            .iter()
            .map(|t| t.get(0).is_some_and(|f| f.in_subworld()))
            .collect();

        Self {
            geometry,
            subframes,
            rotating_states,
            major: 0,
            sub: 0,
            facing: vec![false; store.len()],
            world_space,
            active,
            active_count,
            splines,
        }
    }

    pub fn subframes(&self) -> u32 {
        self.subframes
    }

    pub fn geometry(&self) -> &LevelGeometry {
        &self.geometry
    }

    /// Tick the next call to [`advance`](Self::advance) will process.
    pub fn position(&self) -> (usize, u32) {
        (self.major, self.sub)
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn is_done(&self) -> bool {
        self.active_count == 0
    }

    pub fn facing(&self, id: PlayerId) -> bool {
        self.facing[id]
    }

    pub fn world_space(&self, id: PlayerId) -> bool {
        self.world_space[id]
    }

    /// Playback time of the next tick, in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        elapsed_ms(self.major, self.sub, self.subframes)
    }

    /// Process the current tick and move the clock forward.
    pub fn advance(&mut self, store: &TrajectoryStore) -> TickOutput {
        let mut output = TickOutput {
            major: self.major,
            sub: self.sub,
            subframes: self.subframes,
            elapsed_ms: self.elapsed_ms(),
            players: Vec::with_capacity(self.active_count),
            done: false,
        };

        if self.is_done() {
            output.done = true;
            return output;
        }

        for id in store.ids() {
            if !self.active[id] {
                continue;
            }
            let tick = self.step_player(id, store.trajectory(id));
            if tick == PlayerTick::Finished {
                self.active[id] = false;
                self.active_count -= 1;
            }
            output.players.push((id, tick));
        }

        self.sub += 1;
        if self.sub == self.subframes {
            self.sub = 0;
            self.major += 1;
        }

        output.done = self.is_done();
        output
    }

    fn step_player(&mut self, id: PlayerId, trajectory: &Trajectory) -> PlayerTick {
        let last = trajectory.len() - 1;
        let major = self.major;

        if major >= last && self.sub == self.subframes - 1 {
            return PlayerTick::Finished;
        }

        let frame = trajectory[major];
        self.world_space[id] = frame.in_subworld();

        let rotating = self.rotating_states.contains(&frame.state);

        // Rotated sprites keep the facing they entered the state with.
        if !rotating && major > 0 && trajectory[major - 1].x != frame.x {
            self.facing[id] = frame.x < trajectory[major - 1].x;
        }

        let next_is_transition = trajectory
            .get(major + 1)
            .is_some_and(|next| next.is_transition());
        if frame.is_transition() || next_is_transition {
            return PlayerTick::Suppressed;
        }

        let screen = interpolate_screen(&self.geometry, trajectory, major, self.sub, self.subframes);

        let rotation = if rotating {
            let t = (major as u32 * self.subframes + self.sub) as f64;
            Some(match &self.splines[id] {
                Some(spline) => spline.angle(t),
                None => 0.0,
            })
        } else {
            None
        };

        PlayerTick::Visible(RenderState {
            screen,
            sprite_state: frame.state,
            facing: self.facing[id],
            world_space: self.world_space[id],
            rotation,
        })
    }
}

/// Playback clock for tick `(major, sub)`, truncated to whole milliseconds.
pub fn elapsed_ms(major: usize, sub: u32, subframes: u32) -> u64 {
    let ticks = major as u64 * subframes as u64 + sub as u64;
    ticks * 1000 / (SAMPLES_PER_SECOND as u64 * subframes as u64)
}

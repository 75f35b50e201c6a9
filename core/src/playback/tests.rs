//! Playback scheduler tests

use glam::Vec2;
use ghostreel_shared::Gamestyle;

use crate::replay::{FrameFlags, ReplayFrame, Trajectory};
use crate::test_utils::{frame, store_with, straight_trajectory, trajectory_from_points};

use super::*;

fn geometry() -> LevelGeometry {
    LevelGeometry::new(1, 400, Some(300))
}

fn visible(tick: &PlayerTick) -> RenderState {
    match tick {
        PlayerTick::Visible(state) => *state,
        other => panic!("expected a visible player, got {other:?}"),
    }
}

// ============================================================================
// Interpolation
// ============================================================================

#[test]
fn test_midpoint_between_two_frames() {
    let trajectory = trajectory_from_points(&[(160, 96), (176, 96)]);
    assert_eq!(interpolate_raw(&trajectory, 0, 2, 4).x, 168.0);

    let store = store_with(vec![trajectory], &[100]);
    let mut scheduler = PlaybackScheduler::new(&store, geometry(), Gamestyle::Smb1, 4);
    scheduler.advance(&store);
    scheduler.advance(&store);
    let tick = scheduler.advance(&store);
    assert_eq!((tick.major, tick.sub), (0, 2));

    let state = visible(&tick.players[0].1);
    let g = geometry();
    let expected = (g.to_screen(160, 96, false) + g.to_screen(176, 96, false)) / 2.0;
    assert_eq!(state.screen, expected);
}

#[test]
fn test_sub_zero_lands_exactly_on_frames() {
    let trajectory = trajectory_from_points(&[(1601, 1553), (1733, 1609), (1700, 1400), (1999, 1777)]);
    let g = geometry();
    let store = store_with(vec![trajectory.clone()], &[100]);
    let mut scheduler = PlaybackScheduler::new(&store, g, Gamestyle::Smb1, 8);

    loop {
        let tick = scheduler.advance(&store);
        if let (0, Some((_, PlayerTick::Visible(state)))) = (tick.sub, tick.players.first()) {
            assert_eq!(state.screen, g.frame_to_screen(&trajectory[tick.major]));
        }
        if tick.done {
            break;
        }
    }

    for major in 0..trajectory.len() {
        let raw = interpolate_raw(&trajectory, major, 0, 8);
        assert_eq!(raw, Vec2::new(trajectory[major].x as f32, trajectory[major].y as f32));
    }
}

#[test]
fn test_final_frame_is_held() {
    let store = store_with(vec![trajectory_from_points(&[(1664, 1536), (1680, 1536)])], &[100]);
    let mut scheduler = PlaybackScheduler::new(&store, geometry(), Gamestyle::Smb1, 4);
    for _ in 0..4 {
        scheduler.advance(&store);
    }

    let end = geometry().to_screen(1680, 1536, false);
    for sub in 0..3 {
        let tick = scheduler.advance(&store);
        assert_eq!(tick.sub, sub);
        assert_eq!(visible(&tick.players[0].1).screen, end);
    }
    let tick = scheduler.advance(&store);
    assert_eq!(tick.players, vec![(0, PlayerTick::Finished)]);
}

#[test]
fn test_space_switch_resolves_each_endpoint() {
    let trajectory = Trajectory::new(vec![
        ReplayFrame::new(0, 1664, 1600, FrameFlags::empty()),
        ReplayFrame::new(0, 1680, 1500, FrameFlags::SUBWORLD),
    ]);
    let g = geometry();
    let store = store_with(vec![trajectory], &[100]);
    let mut scheduler = PlaybackScheduler::new(&store, g, Gamestyle::Smb1, 4);

    let first = visible(&scheduler.advance(&store).players[0].1);
    assert_eq!(first.screen, g.to_screen(1664, 1600, false));
    assert!(!first.world_space);

    scheduler.advance(&store);
    let mid = visible(&scheduler.advance(&store).players[0].1);
    let expected = g
        .to_screen(1664, 1600, false)
        .lerp(g.to_screen(1680, 1500, true), 0.5);
    assert_eq!(mid.screen, expected);

    scheduler.advance(&store);
    let after = visible(&scheduler.advance(&store).players[0].1);
    assert!(after.world_space);
    assert_eq!(after.screen, g.to_screen(1680, 1500, true));
}

// ============================================================================
// Clock and termination
// ============================================================================

#[test]
fn test_done_after_longest_trajectory() {
    for subframes in [4, 8] {
        let store = store_with(
            vec![straight_trajectory(3), straight_trajectory(7), straight_trajectory(1)],
            &[300, 700, 100],
        );
        let mut scheduler = PlaybackScheduler::new(&store, geometry(), Gamestyle::Smb1, subframes);

        let mut calls = 0;
        let mut finished = Vec::new();
        loop {
            let tick = scheduler.advance(&store);
            calls += 1;
            finished.extend(tick.finished());
            if tick.done {
                break;
            }
            assert!(calls < 1000, "scheduler never finished");
        }

        assert_eq!(calls, 7 * subframes as usize);
        assert_eq!(finished, vec![2, 0, 1]);
        assert!(scheduler.is_done());
        assert_eq!(scheduler.active_count(), 0);
    }
}

#[test]
fn test_finish_reported_once_on_last_subframe() {
    let store = store_with(vec![straight_trajectory(2)], &[100]);
    let mut scheduler = PlaybackScheduler::new(&store, geometry(), Gamestyle::Smb1, 4);

    let ticks: Vec<_> = (0..8).map(|_| scheduler.advance(&store)).collect();
    for tick in &ticks[..7] {
        assert!(tick.finished().next().is_none());
        assert!(!tick.done);
    }
    assert_eq!((ticks[7].major, ticks[7].sub), (1, 3));
    assert_eq!(ticks[7].finished().collect::<Vec<_>>(), vec![0]);
    assert!(ticks[7].done);

    let after = scheduler.advance(&store);
    assert!(after.players.is_empty());
    assert!(after.done);
}

#[test]
fn test_elapsed_ms() {
    let store = store_with(vec![straight_trajectory(40)], &[100]);
    let mut scheduler = PlaybackScheduler::new(&store, geometry(), Gamestyle::Smb1, 4);
    assert_eq!(scheduler.elapsed_ms(), 0);

    let mut last = None;
    for _ in 0..(15 * 4 + 2) {
        last = Some(scheduler.advance(&store));
    }
    let tick = last.unwrap();
    // Tick (15, 1): one second plus a quarter sample (1000 / 60 ms).
    assert_eq!((tick.major, tick.sub), (15, 1));
    assert_eq!(tick.elapsed_ms, 1016);
    assert_eq!(Quality::Smooth.subframes(), 8);
    assert_eq!(Quality::default(), Quality::Smooth);
}

// ============================================================================
// Suppression and facing
// ============================================================================

#[test]
fn test_transition_suppresses_current_and_previous_segment() {
    let trajectory = Trajectory::new(vec![
        ReplayFrame::new(0, 1664, 1536, FrameFlags::empty()),
        ReplayFrame::new(0, 1680, 1536, FrameFlags::empty()),
        ReplayFrame::new(0, 1696, 1536, FrameFlags::PIPE),
        ReplayFrame::new(0, 1712, 1536, FrameFlags::empty()),
        ReplayFrame::new(0, 1728, 1536, FrameFlags::empty()),
    ]);
    let store = store_with(vec![trajectory], &[100]);
    let mut scheduler = PlaybackScheduler::new(&store, geometry(), Gamestyle::Smb1, 2);

    let mut by_major = Vec::new();
    loop {
        let tick = scheduler.advance(&store);
        if tick.sub == 0 {
            by_major.push(tick.players[0].1);
        }
        if tick.done {
            break;
        }
    }

    assert!(matches!(by_major[0], PlayerTick::Visible(_)));
    // Next frame is a pipe.
    assert_eq!(by_major[1], PlayerTick::Suppressed);
    // Current frame is a pipe.
    assert_eq!(by_major[2], PlayerTick::Suppressed);
    assert!(matches!(by_major[3], PlayerTick::Visible(_)));
    assert!(matches!(by_major[4], PlayerTick::Visible(_)));
}

#[test]
fn test_facing_changes_only_on_horizontal_motion() {
    let store = store_with(
        vec![trajectory_from_points(&[
            (1700, 1536),
            (1690, 1536),
            (1690, 1550),
            (1710, 1550),
            (1710, 1536),
        ])],
        &[100],
    );
    let mut scheduler = PlaybackScheduler::new(&store, geometry(), Gamestyle::Smb1, 1);

    let facing: Vec<bool> = (0..4)
        .map(|_| visible(&scheduler.advance(&store).players[0].1).facing)
        .collect();
    assert_eq!(facing, vec![false, true, true, false]);
}

// ============================================================================
// Rotation
// ============================================================================

#[test]
fn test_facing_frozen_while_rotating() {
    let trajectory = Trajectory::new(
        [(0, 1700), (0, 1690), (13, 1720), (14, 1730), (0, 1740), (0, 1750)]
            .into_iter()
            .map(|(state, x)| ReplayFrame::new(state, x, 1536, FrameFlags::empty()))
            .collect(),
    );
    let store = store_with(vec![trajectory], &[100]);

    let facing = |gamestyle: Gamestyle| {
        let mut scheduler = PlaybackScheduler::new(&store, geometry(), gamestyle, 1);
        (0..5)
            .map(|_| visible(&scheduler.advance(&store).players[0].1).facing)
            .collect::<Vec<_>>()
    };
    assert_eq!(facing(Gamestyle::Smw), vec![false, true, true, true, false]);
    assert_eq!(facing(Gamestyle::Smb1), vec![false, true, false, false, false]);
}

#[test]
fn test_rotating_states_only_in_their_gamestyle() {
    let trajectory = Trajectory::new(
        (0..6)
            .map(|i| ReplayFrame::new(13, 1664 + i * 16, 1536, FrameFlags::empty()))
            .collect(),
    );
    let store = store_with(vec![trajectory], &[100]);

    let mut smw = PlaybackScheduler::new(&store, geometry(), Gamestyle::Smw, 4);
    let state = visible(&smw.advance(&store).players[0].1);
    let angle = state.rotation.expect("balloon state rotates in smw");
    // Moving right: atan2(0, -16).
    assert!((angle.abs() - std::f32::consts::PI).abs() < 1e-4);

    let mut smb1 = PlaybackScheduler::new(&store, geometry(), Gamestyle::Smb1, 4);
    assert!(visible(&smb1.advance(&store).players[0].1).rotation.is_none());
}

#[test]
fn test_single_frame_rotation_falls_back() {
    let store = store_with(
        vec![Trajectory::new(vec![ReplayFrame::new(14, 1664, 1536, FrameFlags::empty())])],
        &[100],
    );
    let mut scheduler = PlaybackScheduler::new(&store, geometry(), Gamestyle::Smw, 4);
    let state = visible(&scheduler.advance(&store).players[0].1);
    assert_eq!(state.rotation, Some(0.0));
    assert_eq!(state.screen, geometry().frame_to_screen(&frame(1664, 1536)));
}

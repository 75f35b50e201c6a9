//! Shared test utilities for unit tests

use flate2::Compression;
use flate2::write::GzEncoder;
use ghostreel_shared::{Character, CountryCode};
use glam::Vec2;
use image::{Rgba, RgbaImage};
use std::io::Write;

use crate::render::{DrawTarget, Rect};
use crate::replay::{FrameFlags, HEADER_SIZE, ReplayFrame, Trajectory, encode_blob};
use crate::source::RunRow;
use crate::store::{PlayerMeta, TrajectoryStore};

// ============================================================================
// Blob Builders
// ============================================================================

/// Header with the given raw frame count and character id, followed by `body`.
pub fn blob_with_body(raw_frame_count: u32, character_id: u8, body: &[u8]) -> Vec<u8> {
    let mut blob = vec![0u8; HEADER_SIZE];
    blob[0x10..0x14].copy_from_slice(&raw_frame_count.to_be_bytes());
    blob[0x14] = character_id;
    blob.extend_from_slice(body);
    blob
}

/// Encode one record by hand, with an optional trailer byte.
pub fn record(flags: u8, state: u8, x: u16, y: u16, trailer: Option<u8>) -> Vec<u8> {
    let mut bytes = vec![(flags << 4) | (state & 0x0F)];
    bytes.extend_from_slice(&x.to_le_bytes());
    bytes.extend_from_slice(&y.to_le_bytes());
    bytes.extend(trailer);
    bytes
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// A row whose blob decodes back to `trajectory`.
pub fn compressed_run(
    player_id: &str,
    time_ms: u64,
    trajectory: &Trajectory,
    character: Character,
) -> RunRow {
    RunRow {
        player_id: player_id.to_string(),
        time_ms,
        replay: gzip(&encode_blob(trajectory, character, false)),
    }
}

// ============================================================================
// Trajectory Builders
// ============================================================================

pub fn frame(x: u16, y: u16) -> ReplayFrame {
    ReplayFrame::new(0, x, y, FrameFlags::empty())
}

pub fn trajectory_from_points(points: &[(u16, u16)]) -> Trajectory {
    Trajectory::new(points.iter().map(|&(x, y)| frame(x, y)).collect())
}

/// `len` overworld frames walking right one tile per sample.
pub fn straight_trajectory(len: usize) -> Trajectory {
    Trajectory::new(
        (0..len)
            .map(|i| frame(104 * 16 + i as u16 * 16, 96 * 16))
            .collect(),
    )
}

pub fn meta(external_id: &str, finish_time_ms: u64, country: Option<&str>) -> PlayerMeta {
    PlayerMeta {
        external_id: external_id.to_string(),
        name: external_id.to_string(),
        code: String::new(),
        country: country.and_then(|c| c.parse::<CountryCode>().ok()),
        character: Character::Mario,
        finish_time_ms,
        avatar_url: None,
        avatar: None,
    }
}

/// Store with one player per trajectory; player `i` finishes at `times[i]`.
pub fn store_with(trajectories: Vec<Trajectory>, times: &[u64]) -> TrajectoryStore {
    let parts = trajectories
        .into_iter()
        .zip(times)
        .enumerate()
        .map(|(i, (trajectory, &time))| (meta(&format!("P{}", i + 1), time, Some("SE")), trajectory))
        .collect();
    TrajectoryStore::from_parts(1, parts)
}

// ============================================================================
// Recording Draw Target
// ============================================================================

/// One call made against a [`RecordingTarget`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Rgba<u8>),
    FillRect { rect: Rect, colour: Rgba<u8> },
    Blit { x: i32, y: i32, w: u32, h: u32 },
    BlitRotated { centre: Vec2, angle: f32, w: u32, h: u32 },
    Line { from: Vec2, to: Vec2, colour: Rgba<u8> },
    Text { x: i32, y: i32, text: String, size: u32, colour: Rgba<u8> },
}

/// Draw target that only records what was asked of it.
pub struct RecordingTarget {
    width: u32,
    height: u32,
    pub calls: Vec<DrawCall>,
}

impl RecordingTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn count(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Every text string drawn, in call order.
    pub fn texts(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Index of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&DrawCall) -> bool) -> Option<usize> {
        self.calls.iter().position(pred)
    }
}

impl DrawTarget for RecordingTarget {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, colour: Rgba<u8>) {
        self.calls.push(DrawCall::Clear(colour));
    }

    fn fill_rect(&mut self, rect: Rect, colour: Rgba<u8>) {
        self.calls.push(DrawCall::FillRect { rect, colour });
    }

    fn blit(&mut self, image: &RgbaImage, x: i32, y: i32) {
        let (w, h) = image.dimensions();
        self.calls.push(DrawCall::Blit { x, y, w, h });
    }

    fn blit_rotated(&mut self, image: &RgbaImage, centre: Vec2, angle: f32) {
        let (w, h) = image.dimensions();
        self.calls.push(DrawCall::BlitRotated { centre, angle, w, h });
    }

    fn line(&mut self, from: Vec2, to: Vec2, colour: Rgba<u8>) {
        self.calls.push(DrawCall::Line { from, to, colour });
    }

    fn text(&mut self, x: i32, y: i32, text: &str, size: u32, colour: Rgba<u8>) {
        self.calls.push(DrawCall::Text {
            x,
            y,
            text: text.to_string(),
            size,
            colour,
        });
    }
}

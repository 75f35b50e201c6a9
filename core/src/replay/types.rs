//! Core types for decoded ghost replays.

use ghostreel_shared::Character;
use serde::{Deserialize, Serialize};

/// Size of the fixed blob header; records start right after it.
pub const HEADER_SIZE: usize = 0x3C;

/// Offset of the raw frame count (u32, big-endian).
pub const FRAME_COUNT_OFFSET: usize = 0x10;

/// Offset of the character id (u8).
pub const CHARACTER_OFFSET: usize = 0x14;

bitflags::bitflags! {
    /// High nibble of a record's first byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameFlags: u8 {
        /// Never observed set; kept so the nibble round-trips.
        const RESERVED = 0b0001;
        /// A variable-length trailer follows the position.
        const TRAILER = 0b0010;
        /// Pipe or door transition. Also implies a trailer.
        const PIPE = 0b0100;
        /// Position is in subworld coordinates.
        const SUBWORLD = 0b1000;
    }
}

impl FrameFlags {
    /// Bits that announce a trailer after the position.
    pub const TRAILER_MASK: FrameFlags = FrameFlags::TRAILER.union(FrameFlags::PIPE);

    pub fn has_trailer(self) -> bool {
        self.intersects(Self::TRAILER_MASK)
    }
}

// Manual serde implementation for FrameFlags
impl Serialize for FrameFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FrameFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(FrameFlags::from_bits_truncate(bits))
    }
}

/// One sampled position of a ghost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Sprite/animation state, 0-15. Meaning depends on the gamestyle.
    pub state: u8,
    /// Fixed-point position; divide by 16 for tile units.
    pub x: u16,
    pub y: u16,
    pub flags: FrameFlags,
}

impl ReplayFrame {
    pub fn new(state: u8, x: u16, y: u16, flags: FrameFlags) -> Self {
        Self {
            state: state & 0x0F,
            x,
            y,
            flags,
        }
    }

    /// The player is inside a pipe or door; the position is meaningless.
    pub fn is_transition(&self) -> bool {
        self.flags.contains(FrameFlags::PIPE)
    }

    pub fn in_subworld(&self) -> bool {
        self.flags.contains(FrameFlags::SUBWORLD)
    }
}

/// Ordered, immutable sequence of frames for one player on one level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    frames: Vec<ReplayFrame>,
}

impl Trajectory {
    pub fn new(frames: Vec<ReplayFrame>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ReplayFrame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[ReplayFrame] {
        &self.frames
    }

    /// Position at the recorded finish.
    pub fn last(&self) -> Option<&ReplayFrame> {
        self.frames.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReplayFrame> {
        self.frames.iter()
    }
}

impl std::ops::Index<usize> for Trajectory {
    type Output = ReplayFrame;

    fn index(&self, index: usize) -> &ReplayFrame {
        &self.frames[index]
    }
}

/// Header fields the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayHeader {
    /// Tick count as stored; biased by 2 and not yet divided by the
    /// 4-tick sampling cadence.
    pub raw_frame_count: u32,
    pub character: Character,
}

impl ReplayHeader {
    /// Number of sampled records: `(raw + 2) / 4`.
    pub fn frame_count(&self) -> usize {
        ((self.raw_frame_count as u64 + 2) / 4) as usize
    }

    /// Smallest raw count that yields `frames` records.
    pub fn raw_count_for(frames: usize) -> u32 {
        (frames as u32).saturating_mul(4).saturating_sub(2)
    }
}

/// How the decoder decides where the record stream ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// Read exactly `header.frame_count()` records.
    #[default]
    FixedCount,
    /// Read until a record at `(0, 0)` or the end of the blob. Used by an
    /// older generation of the format.
    Sentinel,
}

/// Result of decoding one blob.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedReplay {
    pub header: ReplayHeader,
    pub trajectory: Trajectory,
}

//! Ghost replay format
//!
//! A ghost replay is a compressed blob holding one player's recorded run
//! through a level. After decompression it looks like:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Header (0x3C bytes)                          │
//! │ ├─ 0x10: raw frame count (u32, big-endian)   │
//! │ └─ 0x14: character id (u8)                   │
//! ├──────────────────────────────────────────────┤
//! │ Records, one per sampled frame               │
//! │ ├─ flags:4 | state:4 (u8)                    │
//! │ ├─ x (u16, little-endian)                    │
//! │ ├─ y (u16, little-endian)                    │
//! │ └─ trailer (only when flags & 0b0110)        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The game samples positions every 4 ticks, so the number of records is
//! derived from the raw tick count in the header rather than stored.

pub mod binary;
pub mod types;

pub use binary::{BlobWriter, DecodeError, ReplayDecoder, encode_blob};
pub use types::{
    DecodedReplay, FrameFlags, HEADER_SIZE, ReplayFrame, ReplayHeader, TerminationPolicy,
    Trajectory,
};

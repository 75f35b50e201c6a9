//! Ghost replay blob reader
//!
//! Reads decompressed replay payloads record by record.

use crate::replay::types::*;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use ghostreel_shared::Character;
use std::io::Cursor;
use thiserror::Error;

/// Smallest size of a single record (flags/state byte plus x and y).
const RECORD_MIN_SIZE: usize = 5;

/// Errors that make a blob undecodable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("blob is {len} bytes, shorter than the {HEADER_SIZE}-byte header")]
    HeaderTooShort { len: usize },

    #[error("record at offset {offset:#x} needs {needed} bytes but blob is {len} bytes")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("unknown character id {0}")]
    UnknownCharacter(u8),
}

/// Cursor over a blob that refuses to read past the end.
struct BlobCursor<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> BlobCursor<'a> {
    fn new(blob: &'a [u8], offset: usize) -> Self {
        let mut inner = Cursor::new(blob);
        inner.set_position(offset as u64);
        Self { inner }
    }

    fn offset(&self) -> usize {
        self.inner.position() as usize
    }

    fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    fn remaining(&self) -> usize {
        self.len().saturating_sub(self.offset())
    }

    fn require(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            return Err(DecodeError::Truncated {
                offset: self.offset(),
                needed,
                len: self.len(),
            });
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.require(1)?;
        self.inner.read_u8().map_err(|_| self.truncated(1))
    }

    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.require(2)?;
        self.inner
            .read_u16::<LittleEndian>()
            .map_err(|_| self.truncated(2))
    }

    fn skip(&mut self, count: usize) -> Result<(), DecodeError> {
        self.require(count)?;
        self.inner.set_position((self.offset() + count) as u64);
        Ok(())
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::Truncated {
            offset: self.offset(),
            needed,
            len: self.len(),
        }
    }
}

/// Decoder for decompressed ghost replay blobs.
///
/// Decoding is pure: the same bytes always give the same trajectory, and a
/// single decoder can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayDecoder {
    policy: TerminationPolicy,
}

impl ReplayDecoder {
    pub fn new(policy: TerminationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TerminationPolicy {
        self.policy
    }

    /// Read only the header fields.
    pub fn read_header(&self, blob: &[u8]) -> Result<ReplayHeader, DecodeError> {
        if blob.len() < HEADER_SIZE {
            return Err(DecodeError::HeaderTooShort { len: blob.len() });
        }

        let mut count = &blob[FRAME_COUNT_OFFSET..FRAME_COUNT_OFFSET + 4];
        let raw_frame_count = count
            .read_u32::<BigEndian>()
            .map_err(|_| DecodeError::HeaderTooShort { len: blob.len() })?;

        let character_id = blob[CHARACTER_OFFSET];
        let character =
            Character::from_id(character_id).ok_or(DecodeError::UnknownCharacter(character_id))?;

        Ok(ReplayHeader {
            raw_frame_count,
            character,
        })
    }

    /// Decode a full blob into its header and trajectory.
    pub fn decode(&self, blob: &[u8]) -> Result<DecodedReplay, DecodeError> {
        let header = self.read_header(blob)?;
        let mut cursor = BlobCursor::new(blob, HEADER_SIZE);

        let frames = match self.policy {
            TerminationPolicy::FixedCount => {
                let count = header.frame_count();
                // The count comes from untrusted bytes; never reserve more
                // than the body could possibly hold.
                let mut frames =
                    Vec::with_capacity(count.min(cursor.remaining() / RECORD_MIN_SIZE));
                for _ in 0..count {
                    frames.push(read_record(&mut cursor)?);
                }
                frames
            }
            TerminationPolicy::Sentinel => {
                let mut frames = Vec::with_capacity(cursor.remaining() / RECORD_MIN_SIZE);
                while cursor.remaining() > 0 {
                    let frame = read_record(&mut cursor)?;
                    if frame.x == 0 && frame.y == 0 {
                        break;
                    }
                    frames.push(frame);
                }
                frames
            }
        };

        Ok(DecodedReplay {
            header,
            trajectory: Trajectory::new(frames),
        })
    }
}

/// Read one record, consuming its trailer if present.
fn read_record(cursor: &mut BlobCursor<'_>) -> Result<ReplayFrame, DecodeError> {
    let packed = cursor.read_u8()?;
    let flags = FrameFlags::from_bits_truncate(packed >> 4);
    let state = packed & 0x0F;
    let x = cursor.read_u16()?;
    let y = cursor.read_u16()?;

    if flags.has_trailer() {
        let unk1 = cursor.read_u8()?;
        if unk1 & 0b0110 == 0 && unk1 & 0b0001_1000 != 0 {
            cursor.skip(2)?;
        }
    }

    Ok(ReplayFrame {
        state,
        x,
        y,
        flags,
    })
}

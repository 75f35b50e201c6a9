//! Ghost replay blob writer

use crate::replay::types::*;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use ghostreel_shared::Character;
use std::io::{self, Write};

/// Trailer byte written for frames that need one. Has `0b0110` set, so
/// readers never look for the two extra bytes.
const TRAILER_BYTE: u8 = 0b0110;

/// Writer for the ghost replay layout.
pub struct BlobWriter<W: Write> {
    writer: W,
}

impl<W: Write> BlobWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write the fixed header. Everything but the frame count and the
    /// character is zero.
    pub fn write_header(&mut self, frames: usize, character: Character) -> io::Result<()> {
        let mut header = [0u8; HEADER_SIZE];
        let mut count = &mut header[FRAME_COUNT_OFFSET..FRAME_COUNT_OFFSET + 4];
        count.write_u32::<BigEndian>(ReplayHeader::raw_count_for(frames))?;
        header[CHARACTER_OFFSET] = character as u8;
        self.writer.write_all(&header)
    }

    pub fn write_frame(&mut self, frame: &ReplayFrame) -> io::Result<()> {
        self.writer
            .write_u8((frame.flags.bits() << 4) | (frame.state & 0x0F))?;
        self.writer.write_u16::<LittleEndian>(frame.x)?;
        self.writer.write_u16::<LittleEndian>(frame.y)?;
        if frame.flags.has_trailer() {
            self.writer.write_u8(TRAILER_BYTE)?;
        }
        Ok(())
    }

    /// Write an `(0, 0)` record, the end marker of the sentinel layout.
    pub fn write_sentinel(&mut self) -> io::Result<()> {
        self.write_frame(&ReplayFrame::default())
    }

    pub fn write_trajectory(
        &mut self,
        trajectory: &Trajectory,
        character: Character,
    ) -> io::Result<()> {
        self.write_header(trajectory.len(), character)?;
        for frame in trajectory.iter() {
            self.write_frame(frame)?;
        }
        Ok(())
    }

    /// Consume the writer and return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Encode a trajectory into an in-memory blob.
pub fn encode_blob(trajectory: &Trajectory, character: Character, sentinel: bool) -> Vec<u8> {
    let mut writer = BlobWriter::new(Vec::with_capacity(HEADER_SIZE + trajectory.len() * 6));
    // Writing into a Vec cannot fail.
    let _ = writer.write_trajectory(trajectory, character);
    if sentinel {
        let _ = writer.write_sentinel();
    }
    writer.into_inner()
}

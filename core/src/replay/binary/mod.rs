//! Binary ghost replay layout
//!
//! The decoder walks the record stream through a bounds-checked cursor, so a
//! truncated or foreign blob turns into a [`DecodeError`] rather than a
//! panic. The writer produces the same layout and exists mostly so tests
//! and the `inspect` command can build blobs from frames.

mod reader;
mod writer;

pub use reader::{DecodeError, ReplayDecoder};
pub use writer::{BlobWriter, encode_blob};

//! Ghostreel Core - ghost replay decoding and race video rendering
//!
//! Turns a level's recorded ghost runs into a frame sequence where every
//! player races at once, finishers drop off a live leaderboard, and a
//! country chart fills up as they do.
//!
//! # Architecture
//!
//! - [`ReplayDecoder`] - Binary replay blob to [`Trajectory`]
//! - [`TrajectoryStore`] - Every decoded player of one level
//! - [`LeaderboardTracker`] - Pending finishers and per-country tally
//! - [`PlaybackScheduler`] - Lock-step playback clock with sub-frame interpolation
//! - [`Compositor`] - Draw calls for one frame onto a [`DrawTarget`]
//! - [`RenderSession`] - Drives all of the above into a [`FrameSink`]

pub mod assets;
pub mod capture;
pub mod config;
pub mod inflate;
pub mod leaderboard;
pub mod playback;
pub mod render;
pub mod replay;
pub mod session;
pub mod source;
pub mod store;
#[cfg(test)]
pub mod test_utils;

pub use assets::{AssetError, AssetLoader, DirectoryAssets, LevelAssets, Sprite, SpriteSet};
pub use capture::{CaptureError, FrameSink, GifSink, PngSequenceSink, save_png};
pub use config::{LayerSet, OutputFormat, RenderConfig};
pub use inflate::{DecompressError, inflate};
pub use leaderboard::{CountryTally, FinishRecord, LeaderboardTracker};
pub use playback::{
    LevelGeometry, PlaybackScheduler, PlayerTick, Quality, RenderState, TickOutput,
};
pub use render::{Canvas, Compositor, DrawTarget, FrameContext, HeatLines, Layout, Rect};
pub use replay::{
    BlobWriter, DecodeError, DecodedReplay, FrameFlags, ReplayDecoder, ReplayFrame, ReplayHeader,
    TerminationPolicy, Trajectory, encode_blob,
};
pub use session::{RenderSession, SessionError, SessionSummary, open_sink, output_path, overview_path};
pub use source::{ManifestSource, PlayerProfile, ProfileMap, RowSource, RunRow};
pub use store::{PlayerError, PlayerId, PlayerMeta, StoreOptions, TrajectoryStore};

//! One level, from decoded players to a finished frame sequence.

use crate::assets::{AssetError, LevelAssets};
use crate::capture::{CaptureError, FrameSink, GifSink, PngSequenceSink};
use crate::config::{OutputFormat, RenderConfig};
use crate::leaderboard::LeaderboardTracker;
use crate::playback::{PlaybackScheduler, TickOutput};
use crate::render::{Canvas, Compositor, FrameContext, HeatLines, Layout};
use crate::store::{PlayerId, TrajectoryStore};
use ghostreel_shared::LevelInfo;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Rendered frames between progress messages.
const PROGRESS_INTERVAL: u64 = 1000;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("level {level_id} has no playable runs")]
    EmptySession { level_id: u32 },

    #[error("missing level asset: {0}")]
    MissingAsset(#[from] AssetError),

    #[error("frame output failed: {0}")]
    Sink(#[from] CaptureError),
}

/// What a finished session produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub level_id: u32,
    pub frames: u64,
    pub players: usize,
    pub finishers: usize,
}

/// Owns every piece of per-level state for the duration of a render.
pub struct RenderSession {
    store: TrajectoryStore,
    tracker: LeaderboardTracker,
    scheduler: PlaybackScheduler,
    compositor: Compositor,
    canvas: Canvas,
    /// Finishers of the last drawn tick, still on the board.
    pending: Vec<PlayerId>,
    finishers: usize,
    done: bool,
}

impl RenderSession {
    pub fn new(
        store: TrajectoryStore,
        assets: LevelAssets,
        config: &RenderConfig,
        info: LevelInfo,
    ) -> Result<Self, SessionError> {
        if store.is_empty() {
            return Err(SessionError::EmptySession {
                level_id: store.level_id(),
            });
        }

        let scale = config.scale();
        let heat = HeatLines::new(&store, info.line_exponent, config.top_highlight);
        let compositor = Compositor::new(
            assets,
            heat,
            scale,
            config.layers.resolve(),
            config.leaderboard_rows,
        );
        let layout = *compositor.layout();
        let scheduler =
            PlaybackScheduler::new(&store, layout.geometry, info.gamestyle, config.subframes());
        let tracker = LeaderboardTracker::from_store(&store);

        Ok(Self {
            store,
            tracker,
            scheduler,
            compositor,
            canvas: Canvas::new(layout.width, layout.height),
            pending: Vec::new(),
            finishers: 0,
            done: false,
        })
    }

    pub fn store(&self) -> &TrajectoryStore {
        &self.store
    }

    pub fn tracker(&self) -> &LeaderboardTracker {
        &self.tracker
    }

    /// Canvas contents after the last [`render_tick`](Self::render_tick).
    pub fn frame(&self) -> &RgbaImage {
        self.canvas.image()
    }

    pub fn layout(&self) -> &Layout {
        self.compositor.layout()
    }

    pub fn frame_size(&self) -> (u32, u32) {
        let layout = self.layout();
        (layout.width, layout.height)
    }

    /// Number of frames [`run`](Self::run) will produce.
    pub fn expected_frames(&self) -> u64 {
        self.store.max_frames() as u64 * self.scheduler.subframes() as u64
    }

    /// Still image with every complete trail.
    pub fn render_overview(&self) -> RgbaImage {
        let (width, height) = self.frame_size();
        let mut canvas = Canvas::new(width, height);
        self.compositor.compose_overview(&mut canvas, &self.store);
        canvas.into_image()
    }

    /// Render every tick into `sink`, then close it.
    ///
    /// The tick on which the last player finishes is still drawn.
    pub fn run(mut self, sink: &mut dyn FrameSink) -> Result<SessionSummary, SessionError> {
        let level_id = self.store.level_id();
        info!(
            "Rendering level {}: {} players, {} subframes, {} frames",
            level_id,
            self.store.len(),
            self.scheduler.subframes(),
            self.expected_frames()
        );

        let mut frames = 0u64;
        while self.render_tick().is_some() {
            sink.submit(frames, self.canvas.image())?;
            frames += 1;

            if frames % PROGRESS_INTERVAL == 0 {
                info!("Level {}: {} frames rendered", level_id, frames);
            }
        }

        sink.finish()?;
        info!("Level {} finished after {} frames", level_id, frames);

        Ok(SessionSummary {
            level_id,
            frames,
            players: self.store.len(),
            finishers: self.finishers,
        })
    }

    /// Advance one tick and composite it into the canvas.
    ///
    /// A player leaves the leaderboard only after the tick on which they
    /// finish has been drawn. Returns `None` once the final tick is out.
    pub fn render_tick(&mut self) -> Option<TickOutput> {
        self.retire_pending();
        if self.done {
            return None;
        }

        let tick = self.scheduler.advance(&self.store);
        let frame = FrameContext {
            store: &self.store,
            tracker: &self.tracker,
            tick: &tick,
        };
        self.compositor.compose(&mut self.canvas, &frame);

        self.pending.extend(tick.finished());
        self.done = tick.done;
        Some(tick)
    }

    fn retire_pending(&mut self) {
        for id in self.pending.drain(..) {
            let record = self.tracker.pop_finished();
            debug!("Player {} finished ({} ms)", id, record.time_ms);
            self.finishers += 1;
        }
    }
}

/// Output path for a level: a frame directory, or a `.gif` file.
///
/// Active overlays add `_names` or `_lines` to the stem.
pub fn output_path(dir: &Path, level_id: u32, config: &RenderConfig) -> PathBuf {
    let stem = format!("{}{}", level_id, config.output_suffix());
    match config.output.format {
        OutputFormat::PngSequence => dir.join(stem),
        OutputFormat::Gif => dir.join(format!("{}.gif", stem)),
    }
}

/// Path of the trail overview still for a level.
pub fn overview_path(dir: &Path, level_id: u32) -> PathBuf {
    dir.join(format!("{}_lines.png", level_id))
}

/// Sink matching the configured output format.
pub fn open_sink(
    path: &Path,
    config: &RenderConfig,
    (width, height): (u32, u32),
) -> Result<Box<dyn FrameSink>, CaptureError> {
    Ok(match config.output.format {
        OutputFormat::PngSequence => Box::new(PngSequenceSink::create(path)?),
        OutputFormat::Gif => Box::new(GifSink::create(path, width, height, config.output.fps)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{store_with, straight_trajectory};
    use ghostreel_shared::Gamestyle;
    use image::Rgba;

    const INFO: LevelInfo = LevelInfo {
        gamestyle: Gamestyle::Smb1,
        line_exponent: 0.025,
    };

    /// Counts frames and checks they arrive in order.
    #[derive(Default)]
    struct CountingSink {
        next: u64,
        finished: bool,
        size: Option<(u32, u32)>,
    }

    impl FrameSink for CountingSink {
        fn submit(&mut self, index: u64, frame: &RgbaImage) -> Result<(), CaptureError> {
            assert_eq!(index, self.next);
            assert!(!self.finished);
            self.next += 1;
            self.size = Some(frame.dimensions());
            Ok(())
        }

        fn finish(&mut self) -> Result<(), CaptureError> {
            self.finished = true;
            Ok(())
        }
    }

    struct FailingSink;

    impl FrameSink for FailingSink {
        fn submit(&mut self, _index: u64, _frame: &RgbaImage) -> Result<(), CaptureError> {
            Err(CaptureError::WriterGone)
        }

        fn finish(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    fn small_config() -> RenderConfig {
        RenderConfig {
            scale: 1,
            quality: crate::playback::Quality::Standard,
            ..RenderConfig::default()
        }
    }

    fn session(lengths: &[usize], times: &[u64]) -> RenderSession {
        let trajectories = lengths.iter().map(|&n| straight_trajectory(n)).collect();
        let store = store_with(trajectories, times);
        let assets = LevelAssets::new(RgbaImage::new(64, 32), None);
        RenderSession::new(store, assets, &small_config(), INFO).unwrap()
    }

    #[test]
    fn test_run_renders_until_done() {
        let session = session(&[3, 7, 5], &[300, 700, 500]);
        let size = session.frame_size();
        assert_eq!(session.expected_frames(), 28);

        let mut sink = CountingSink::default();
        let summary = session.run(&mut sink).unwrap();
        assert_eq!(
            summary,
            SessionSummary {
                level_id: 1,
                frames: 28,
                players: 3,
                finishers: 3,
            }
        );
        assert!(sink.finished);
        assert_eq!(sink.next, 28);
        assert_eq!(sink.size, Some(size));
    }

    #[test]
    fn test_finisher_stays_on_board_for_finishing_frame() {
        // Standard quality: 4 subframes, so player 0 finishes on tick 8.
        let mut session = session(&[2, 4], &[100, 200]);
        for _ in 0..7 {
            let tick = session.render_tick().unwrap();
            assert_eq!(tick.finished().count(), 0);
        }

        let tick = session.render_tick().unwrap();
        assert_eq!(tick.finished().collect::<Vec<_>>(), vec![0]);
        assert_eq!(session.tracker().len(), 2);
        assert!(session.tracker().tally().is_empty());

        session.render_tick().unwrap();
        assert_eq!(session.tracker().len(), 1);
        assert_eq!(session.tracker().tally().max_count(), 1);

        while session.render_tick().is_some() {}
        assert!(session.tracker().is_empty());
        assert_eq!(session.tracker().tally().max_count(), 2);
        assert!(session.render_tick().is_none());
    }

    #[test]
    fn test_sink_failure_aborts() {
        let session = session(&[3], &[300]);
        let err = session.run(&mut FailingSink).unwrap_err();
        assert!(matches!(err, SessionError::Sink(CaptureError::WriterGone)));
    }

    #[test]
    fn test_empty_store_is_rejected() {
        let store = store_with(vec![], &[]);
        let assets = LevelAssets::new(RgbaImage::new(8, 8), None);
        let err = RenderSession::new(store, assets, &small_config(), INFO)
            .err()
            .unwrap();
        assert!(matches!(err, SessionError::EmptySession { level_id: 1 }));
    }

    #[test]
    fn test_overview_has_trail_pixels() {
        let session = session(&[6, 6], &[100, 200]);
        let overview = session.render_overview();
        assert_eq!(overview.dimensions(), session.frame_size());
        let blue = Rgba([128, 206, 255, 255]);
        assert!(overview.pixels().any(|&p| p == blue));
    }

    #[test]
    fn test_output_naming() {
        let dir = Path::new("/out");
        let mut config = RenderConfig::default();
        assert_eq!(output_path(dir, 42, &config), dir.join("42"));

        config.layers.heat_lines = true;
        config.output.format = OutputFormat::Gif;
        assert_eq!(output_path(dir, 42, &config), dir.join("42_lines.gif"));

        config.layers.names = true;
        assert_eq!(output_path(dir, 42, &config), dir.join("42_names.gif"));

        assert_eq!(overview_path(dir, 42), dir.join("42_lines.png"));
    }
}

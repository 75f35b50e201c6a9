//! Render command - one video (or frame directory) per level

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use ghostreel_core::config::{self, OutputFormat, RenderConfig};
use ghostreel_core::playback::Quality;
use ghostreel_core::replay::TerminationPolicy;
use ghostreel_core::{
    AssetLoader, DirectoryAssets, ManifestSource, ProfileMap, RenderSession, RowSource,
    SessionSummary, TrajectoryStore, open_sink, output_path, overview_path, save_png,
};
use ghostreel_shared::constants::DEFAULT_LINE_EXPONENT;
use ghostreel_shared::{Gamestyle, LevelInfo, level_info};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::avatars;

#[derive(Clone, Copy, ValueEnum)]
pub enum QualityArg {
    /// 4 frames per sample
    Standard,
    /// 8 frames per sample
    Smooth,
}

impl From<QualityArg> for Quality {
    fn from(value: QualityArg) -> Self {
        match value {
            QualityArg::Standard => Quality::Standard,
            QualityArg::Smooth => Quality::Smooth,
        }
    }
}

/// Where runs and art come from; shared with the overview command.
#[derive(Args)]
pub struct InputArgs {
    /// Directory with players.toml and one runs.toml per level
    #[arg(long)]
    pub data: PathBuf,

    /// Directory with levels/, players/ and flags/ art
    #[arg(long)]
    pub assets: PathBuf,

    /// Config file (defaults to ghostreel.toml in the config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Avatar cache directory (defaults to the platform cache directory)
    #[arg(long)]
    pub avatar_cache: Option<PathBuf>,

    /// Skip avatar thumbnails
    #[arg(long)]
    pub no_avatars: bool,
}

/// Arguments for the render command
#[derive(Args)]
pub struct RenderArgs {
    /// Level ids to render
    #[arg(long, num_args = 1.., required = true)]
    pub ids: Vec<u32>,

    #[command(flatten)]
    pub input: InputArgs,

    /// Output directory
    #[arg(long)]
    pub out: PathBuf,

    /// Interpolation density
    #[arg(long, value_enum)]
    pub quality: Option<QualityArg>,

    /// Pixel scale factor
    #[arg(long)]
    pub scale: Option<u32>,

    /// Draw heat-line trails
    #[arg(long)]
    pub lines: bool,

    /// Draw player names over sprites
    #[arg(long)]
    pub names: bool,

    /// Write an animated GIF instead of a PNG sequence
    #[arg(long)]
    pub gif: bool,

    /// Keep only the N fastest runs
    #[arg(long)]
    pub only_fastest: Option<usize>,

    /// Stop after N decoded players
    #[arg(long)]
    pub max_players: Option<usize>,

    /// Blobs end with a (0, 0) record instead of using the header count
    #[arg(long)]
    pub sentinel: bool,
}

impl RenderArgs {
    /// Config file values with command-line overrides applied.
    fn resolve_config(&self) -> Result<RenderConfig> {
        let mut config = load_config(self.input.config.as_deref())?;
        if let Some(quality) = self.quality {
            config.quality = quality.into();
        }
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        config.layers.heat_lines |= self.lines;
        config.layers.names |= self.names;
        if self.gif {
            config.output.format = OutputFormat::Gif;
        }
        if self.only_fastest.is_some() {
            config.decode.only_fastest = self.only_fastest;
        }
        if self.max_players.is_some() {
            config.decode.max_players = self.max_players;
        }
        if self.sentinel {
            config.decode.termination = TerminationPolicy::Sentinel;
        }
        Ok(config)
    }
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let config = args.resolve_config()?;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create {}", args.out.display()))?;

    let source = ManifestSource::new(&args.input.data);
    let profiles = source.profiles()?;

    let mut failed = 0;
    for &level_id in &args.ids {
        match render_level(level_id, &args, &config, &source, &profiles) {
            Ok(summary) => info!(
                "Level {}: {} frames, {} players",
                summary.level_id, summary.frames, summary.players
            ),
            Err(e) => {
                error!("Level {} aborted: {:#}", level_id, e);
                failed += 1;
            }
        }
    }

    if failed == args.ids.len() {
        bail!("All {} levels failed", failed);
    }
    Ok(())
}

fn render_level(
    level_id: u32,
    args: &RenderArgs,
    config: &RenderConfig,
    source: &impl RowSource,
    profiles: &ProfileMap,
) -> Result<SessionSummary> {
    let info = level_info_or_default(level_id);
    let session = open_session(level_id, &args.input, config, source, profiles, info)?;

    if config.layers.heat_lines {
        let path = overview_path(&args.out, level_id);
        save_png(&path, &session.render_overview())?;
        info!("Saved overview: {}", path.display());
    }

    let path = output_path(&args.out, level_id, config);
    let mut sink = open_sink(&path, config, session.frame_size())
        .with_context(|| format!("Failed to open output {}", path.display()))?;
    Ok(session.run(sink.as_mut())?)
}

/// Decode a level's runs, attach avatars and load its art.
pub fn open_session(
    level_id: u32,
    input: &InputArgs,
    config: &RenderConfig,
    source: &impl RowSource,
    profiles: &ProfileMap,
    info: LevelInfo,
) -> Result<RenderSession> {
    let rows = source.runs(level_id)?;
    let mut store =
        TrajectoryStore::populate(level_id, &rows, profiles, config.store_options())?;
    if store.dropped() > 0 {
        warn!("Level {}: dropped {} runs", level_id, store.dropped());
    }

    if !input.no_avatars {
        match avatar_cache(input) {
            Some(cache) => {
                let attached = avatars::attach(&mut store, &cache, config.scale())?;
                info!("Attached {} avatars", attached);
            }
            None => warn!("No cache directory; rendering without avatars"),
        }
    }

    let assets = DirectoryAssets::new(&input.assets, config.scale())
        .load_level(&store, info.gamestyle)
        .with_context(|| format!("Failed to load art for level {}", level_id))?;
    Ok(RenderSession::new(store, assets, config, info)?)
}

pub fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    match path {
        Some(path) => config::load_from(path),
        None => Ok(config::load()),
    }
}

/// Table entry for `level_id`, or SMB1 with the default exponent.
pub fn level_info_or_default(level_id: u32) -> LevelInfo {
    level_info(level_id).unwrap_or_else(|| {
        warn!(
            "Level {} is not in the level table; using {} defaults",
            level_id,
            Gamestyle::Smb1
        );
        LevelInfo {
            gamestyle: Gamestyle::Smb1,
            line_exponent: DEFAULT_LINE_EXPONENT,
        }
    })
}

fn avatar_cache(input: &InputArgs) -> Option<PathBuf> {
    input
        .avatar_cache
        .clone()
        .or_else(|| config::cache_dir().map(|dir| dir.join("avatars")))
}

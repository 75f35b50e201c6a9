//! Render configuration (`ghostreel.toml`)
//!
//! Every field has a default, so an empty or partial file is valid. The
//! layer switches are resolved once per session into a [`LayerSet`].

use anyhow::{Context, Result};
use ghostreel_shared::constants::{DEFAULT_LEADERBOARD_ROWS, DEFAULT_TOP_HIGHLIGHT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::playback::Quality;
use crate::replay::TerminationPolicy;
use crate::store::StoreOptions;

const CONFIG_FILE: &str = "ghostreel.toml";

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Interpolation density (default: smooth, 8 frames per sample)
    #[serde(default)]
    pub quality: Quality,
    /// Integer pixel multiplier for the whole canvas (default: 2)
    #[serde(default = "default_scale")]
    pub scale: u32,
    #[serde(default)]
    pub layers: LayerConfig,
    /// Leaderboard rows shown at once (default: 36)
    #[serde(default = "default_leaderboard_rows")]
    pub leaderboard_rows: usize,
    /// Fastest finishers drawn in the reserved heat-line colour (default: 10)
    #[serde(default = "default_top_highlight")]
    pub top_highlight: usize,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub decode: DecodeConfig,
}

/// Optional overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Player sprites (default: true)
    #[serde(default = "default_true")]
    pub sprites: bool,
    /// Trajectory trails and their legend (default: false)
    #[serde(default)]
    pub heat_lines: bool,
    /// Player names above sprites (default: false)
    #[serde(default)]
    pub names: bool,
    /// Playback clock (default: true)
    #[serde(default = "default_true")]
    pub timer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Numbered PNG files for an external encoder
    #[default]
    PngSequence,
    /// One animated GIF
    Gif,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Playback rate written into the output (default: 60)
    #[serde(default = "default_fps")]
    pub fps: u32,
}

/// How runs are read and filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DecodeConfig {
    #[serde(default)]
    pub termination: TerminationPolicy,
    /// Keep only the N fastest finishers
    #[serde(default)]
    pub only_fastest: Option<usize>,
    /// Stop after N decoded players
    #[serde(default)]
    pub max_players: Option<usize>,
}

bitflags::bitflags! {
    /// Layers drawn by the compositor, resolved from [`LayerConfig`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerSet: u8 {
        const SPRITES = 1 << 0;
        const HEAT_LINES = 1 << 1;
        const NAMES = 1 << 2;
        const TIMER = 1 << 3;
    }
}

fn default_true() -> bool {
    true
}

fn default_scale() -> u32 {
    2
}

fn default_fps() -> u32 {
    60
}

fn default_leaderboard_rows() -> usize {
    DEFAULT_LEADERBOARD_ROWS
}

fn default_top_highlight() -> usize {
    DEFAULT_TOP_HIGHLIGHT
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            scale: default_scale(),
            layers: LayerConfig::default(),
            leaderboard_rows: default_leaderboard_rows(),
            top_highlight: default_top_highlight(),
            output: OutputConfig::default(),
            decode: DecodeConfig::default(),
        }
    }
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            sprites: true,
            heat_lines: false,
            names: false,
            timer: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            fps: default_fps(),
        }
    }
}

impl LayerConfig {
    pub fn resolve(&self) -> LayerSet {
        let mut set = LayerSet::empty();
        set.set(LayerSet::SPRITES, self.sprites);
        set.set(LayerSet::HEAT_LINES, self.heat_lines);
        set.set(LayerSet::NAMES, self.names);
        set.set(LayerSet::TIMER, self.timer);
        set
    }
}

impl RenderConfig {
    pub fn subframes(&self) -> u32 {
        self.quality.subframes()
    }

    /// Scale clamped to at least 1.
    pub fn scale(&self) -> u32 {
        self.scale.max(1)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            policy: self.decode.termination,
            only_fastest: self.decode.only_fastest,
            max_players: self.decode.max_players,
        }
    }

    /// Suffix added to output names for the active overlays.
    pub fn output_suffix(&self) -> &'static str {
        if self.layers.names {
            "_names"
        } else if self.layers.heat_lines {
            "_lines"
        } else {
            ""
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/ghostreel`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "ghostreel", "ghostreel")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific cache directory (avatar thumbnails).
pub fn cache_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "ghostreel", "ghostreel")
        .map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Loads the configuration from the config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> RenderConfig {
    config_dir()
        .and_then(|dir| std::fs::read_to_string(dir.join(CONFIG_FILE)).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Loads an explicitly named configuration file.
///
/// Unlike [`load`], a missing or malformed file is an error.
pub fn load_from(path: &Path) -> Result<RenderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Writes the configuration as pretty TOML, creating parent directories.
pub fn save_to(config: &RenderConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Saves the configuration to the config directory.
pub fn save(config: &RenderConfig) -> Result<()> {
    let dir = config_dir().context("Failed to determine config directory")?;
    save_to(config, &dir.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = RenderConfig::default();
        assert_eq!(config.quality, Quality::Smooth);
        assert_eq!(config.subframes(), 8);
        assert_eq!(config.scale, 2);
        assert_eq!(config.leaderboard_rows, 36);
        assert_eq!(config.top_highlight, 10);
        assert_eq!(config.output.fps, 60);
        assert_eq!(config.output.format, OutputFormat::PngSequence);
        assert_eq!(config.decode.termination, TerminationPolicy::FixedCount);
        assert_eq!(config.layers.resolve(), LayerSet::SPRITES | LayerSet::TIMER);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: RenderConfig = toml::from_str("").unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let toml_str = r#"
quality = "standard"

[layers]
heat_lines = true

[output]
format = "gif"

[decode]
termination = "sentinel"
only_fastest = 100
"#;
        let config: RenderConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.subframes(), 4);
        assert!(config.layers.heat_lines);
        assert!(config.layers.sprites);
        assert_eq!(config.output.format, OutputFormat::Gif);
        assert_eq!(config.output.fps, 60);
        assert_eq!(config.decode.termination, TerminationPolicy::Sentinel);
        assert_eq!(config.store_options().only_fastest, Some(100));
        assert_eq!(config.output_suffix(), "_lines");
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = RenderConfig::default();
        config.scale = 3;
        config.layers.names = true;
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.output_suffix(), "_names");
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let dir = TempDir::new().unwrap();
        assert!(load_from(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_scale_is_at_least_one() {
        let config = RenderConfig {
            scale: 0,
            ..Default::default()
        };
        assert_eq!(config.scale(), 1);
    }
}

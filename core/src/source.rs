//! Where runs and player profiles come from.
//!
//! The renderer only needs, per level, a list of `(player, time, blob)` rows
//! and, per player, a profile. [`ManifestSource`] reads both from TOML
//! manifests on disk:
//!
//! ```text
//! <data>/players.toml            [[player]] pid, name, code, country, avatar_url
//! <data>/<level_id>/runs.toml    [[run]]    pid, time_ms, replay
//! ```
//!
//! `replay` is a path to the compressed blob, relative to the level directory.

use anyhow::{Context, Result};
use ghostreel_shared::CountryCode;
use hashbrown::HashMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One recorded run of a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRow {
    pub player_id: String,
    pub time_ms: u64,
    /// Compressed replay blob.
    pub replay: Vec<u8>,
}

/// Display data for a player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerProfile {
    pub name: String,
    /// Public maker code.
    pub code: String,
    pub country: Option<CountryCode>,
    pub avatar_url: Option<String>,
}

pub type ProfileMap = HashMap<String, PlayerProfile>;

/// Supplier of level runs and player profiles.
pub trait RowSource {
    /// All runs recorded for a level, in source order.
    fn runs(&self, level_id: u32) -> Result<Vec<RunRow>>;

    /// Profiles keyed by external player id.
    fn profiles(&self) -> Result<ProfileMap>;
}

#[derive(Debug, Deserialize)]
struct RunsManifest {
    #[serde(default)]
    run: Vec<RunEntry>,
}

#[derive(Debug, Deserialize)]
struct RunEntry {
    pid: String,
    time_ms: u64,
    replay: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PlayersManifest {
    #[serde(default)]
    player: Vec<PlayerEntry>,
}

#[derive(Debug, Deserialize)]
struct PlayerEntry {
    pid: String,
    name: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

/// Row source backed by TOML manifests in a data directory.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    root: PathBuf,
}

impl ManifestSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn level_dir(&self, level_id: u32) -> PathBuf {
        self.root.join(level_id.to_string())
    }
}

impl RowSource for ManifestSource {
    fn runs(&self, level_id: u32) -> Result<Vec<RunRow>> {
        let dir = self.level_dir(level_id);
        let path = dir.join("runs.toml");
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read run manifest: {}", path.display()))?;
        let manifest: RunsManifest = toml::from_str(&text)
            .with_context(|| format!("Failed to parse run manifest: {}", path.display()))?;

        manifest
            .run
            .into_iter()
            .map(|entry| {
                let blob_path = dir.join(&entry.replay);
                let replay = std::fs::read(&blob_path).with_context(|| {
                    format!("Failed to read replay blob: {}", blob_path.display())
                })?;
                Ok(RunRow {
                    player_id: entry.pid,
                    time_ms: entry.time_ms,
                    replay,
                })
            })
            .collect()
    }

    fn profiles(&self) -> Result<ProfileMap> {
        let path = self.root.join("players.toml");
        if !path.exists() {
            tracing::warn!("No player manifest at {}, names will be ids", path.display());
            return Ok(ProfileMap::new());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read player manifest: {}", path.display()))?;
        let manifest: PlayersManifest = toml::from_str(&text)
            .with_context(|| format!("Failed to parse player manifest: {}", path.display()))?;

        Ok(manifest
            .player
            .into_iter()
            .map(|entry| {
                let country = entry.country.parse::<CountryCode>().ok();
                if country.is_none() && !entry.country.is_empty() {
                    tracing::debug!("Player {} has unknown country {:?}", entry.pid, entry.country);
                }
                let profile = PlayerProfile {
                    name: entry.name,
                    code: entry.code,
                    country,
                    avatar_url: entry.avatar_url.filter(|url| !url.is_empty()),
                };
                (entry.pid, profile)
            })
            .collect())
    }
}

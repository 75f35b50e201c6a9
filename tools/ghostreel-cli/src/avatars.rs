//! Player avatar thumbnails
//!
//! Avatars are cached as `<cache>/<pid>.png`. Missing ones are downloaded
//! concurrently before the session starts; any avatar that fails to
//! download or decode is skipped with a warning.

use anyhow::{Context, Result};
use ghostreel_core::TrajectoryStore;
use ghostreel_shared::constants::{AVATAR_SIZE, MAX_PARALLEL_DOWNLOADS};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Square region of the source avatar that holds the face.
const CROP_ORIGIN: u32 = 75;
const CROP_END: u32 = 437;

#[derive(Error, Debug)]
pub enum AvatarError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cache file for a player.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`, so the file always lands
/// directly inside `cache`.
pub fn cache_path(cache: &Path, player_id: &str) -> PathBuf {
    let stem: String = player_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    cache.join(format!("{}.png", stem))
}

/// Leaderboard thumbnail: the face crop, scaled to the row size.
///
/// Images too small for the crop are scaled whole.
pub fn thumbnail(avatar: &RgbaImage, scale: u32) -> RgbaImage {
    let side = AVATAR_SIZE * scale;
    let (w, h) = avatar.dimensions();
    if w >= CROP_END && h >= CROP_END {
        let crop = imageops::crop_imm(
            avatar,
            CROP_ORIGIN,
            CROP_ORIGIN,
            CROP_END - CROP_ORIGIN,
            CROP_END - CROP_ORIGIN,
        )
        .to_image();
        imageops::resize(&crop, side, side, FilterType::Nearest)
    } else {
        imageops::resize(avatar, side, side, FilterType::Nearest)
    }
}

/// Fill in avatar thumbnails for every player with an avatar URL.
///
/// Returns the number of players that got one.
pub fn attach(store: &mut TrajectoryStore, cache: &Path, scale: u32) -> Result<usize> {
    std::fs::create_dir_all(cache)
        .with_context(|| format!("Failed to create avatar cache {}", cache.display()))?;

    let missing: Vec<(String, String)> = store
        .players()
        .iter()
        .filter_map(|p| {
            let url = p.avatar_url.as_ref()?;
            let path = cache_path(cache, &p.external_id);
            (!path.exists()).then(|| (url.clone(), p.external_id.clone()))
        })
        .collect();

    if !missing.is_empty() {
        debug!("Downloading {} avatars", missing.len());
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start download runtime")?;
        runtime.block_on(download_all(missing, cache.to_path_buf()));
    }

    let mut attached = 0;
    for id in store.ids() {
        let player = store.player(id);
        if player.avatar_url.is_none() {
            continue;
        }
        let path = cache_path(cache, &player.external_id);
        if !path.exists() {
            continue;
        }
        match image::open(&path) {
            Ok(avatar) => {
                let thumb = thumbnail(&avatar.to_rgba8(), scale);
                store.set_avatar(id, Arc::new(thumb));
                attached += 1;
            }
            Err(e) => warn!("Bad cached avatar {}: {}", path.display(), e),
        }
    }
    Ok(attached)
}

async fn download_all(jobs: Vec<(String, String)>, cache: PathBuf) {
    let client = reqwest::Client::new();
    let permits = Arc::new(Semaphore::new(MAX_PARALLEL_DOWNLOADS));
    let mut tasks = JoinSet::new();

    for (url, player_id) in jobs {
        let client = client.clone();
        let permits = permits.clone();
        let path = cache_path(&cache, &player_id);
        tasks.spawn(async move {
            // The semaphore is never closed.
            let _permit = permits.acquire_owned().await.ok();
            let result = download_avatar(&client, &url, &path).await;
            (player_id, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((player_id, Err(e))) => warn!("Avatar for {} not downloaded: {}", player_id, e),
            Ok((_, Ok(()))) => {}
            Err(e) => warn!("Avatar task failed: {}", e),
        }
    }
}

/// Fetch one avatar and store it as PNG whatever format the server sent.
async fn download_avatar(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
) -> Result<(), AvatarError> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    let image = image::load_from_memory(&bytes)?.to_rgba8();

    let mut png = Vec::new();
    image.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)?;
    tokio::fs::write(path, png).await?;
    Ok(())
}

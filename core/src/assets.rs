//! Level art: backgrounds, character sprites and country flags.
//!
//! Everything is upscaled to the session's pixel scale once, at load time,
//! so the compositor only ever does 1:1 blits.

use crate::playback::LevelGeometry;
use crate::store::TrajectoryStore;
use ghostreel_shared::constants::{CHARACTER_COUNT, FLAG_HEIGHT, FLAG_WIDTH, PLAYER_STATE_COUNT};
use ghostreel_shared::{Character, CountryCode, Gamestyle};
use hashbrown::HashMap;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("missing asset: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// One sprite state, stored as drawn when facing right and pre-mirrored.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub plain: RgbaImage,
    pub mirrored: RgbaImage,
}

impl Sprite {
    pub fn new(plain: RgbaImage) -> Self {
        let mirrored = imageops::flip_horizontal(&plain);
        Self { plain, mirrored }
    }

    pub fn image(&self, mirrored: bool) -> &RgbaImage {
        if mirrored { &self.mirrored } else { &self.plain }
    }
}

/// Sprites of one character, indexed by animation state.
#[derive(Debug, Clone)]
pub struct SpriteSet {
    states: Vec<Option<Sprite>>,
}

impl Default for SpriteSet {
    fn default() -> Self {
        Self {
            states: vec![None; PLAYER_STATE_COUNT],
        }
    }
}

impl SpriteSet {
    pub fn set(&mut self, state: u8, sprite: Sprite) {
        self.states[state as usize & 0x0F] = Some(sprite);
    }

    pub fn get(&self, state: u8) -> Option<&Sprite> {
        self.states.get(state as usize)?.as_ref()
    }

    /// Number of states with art.
    pub fn loaded(&self) -> usize {
        self.states.iter().filter(|s| s.is_some()).count()
    }
}

/// Every image a session draws, already at output scale.
#[derive(Debug, Clone)]
pub struct LevelAssets {
    pub overworld: RgbaImage,
    pub subworld: Option<RgbaImage>,
    sprites: Vec<SpriteSet>,
    flags: HashMap<CountryCode, RgbaImage>,
}

impl LevelAssets {
    pub fn new(overworld: RgbaImage, subworld: Option<RgbaImage>) -> Self {
        Self {
            overworld,
            subworld,
            sprites: vec![SpriteSet::default(); CHARACTER_COUNT],
            flags: HashMap::new(),
        }
    }

    /// Screen geometry for these backgrounds at `scale`.
    pub fn geometry(&self, scale: u32) -> LevelGeometry {
        LevelGeometry::new(
            scale,
            self.overworld.height(),
            self.subworld.as_ref().map(|s| s.height()),
        )
    }

    pub fn set_sprites(&mut self, character: Character, sprites: SpriteSet) {
        self.sprites[character.index()] = sprites;
    }

    pub fn sprite(&self, character: Character, state: u8) -> Option<&Sprite> {
        self.sprites[character.index()].get(state)
    }

    pub fn insert_flag(&mut self, country: CountryCode, flag: RgbaImage) {
        self.flags.insert(country, flag);
    }

    pub fn flag(&self, country: CountryCode) -> Option<&RgbaImage> {
        self.flags.get(&country)
    }
}

/// Source of level art.
pub trait AssetLoader {
    /// Overworld and optional subworld background.
    fn load_backgrounds(&self, level_id: u32)
    -> Result<(RgbaImage, Option<RgbaImage>), AssetError>;

    /// Whatever states exist for `character` in `gamestyle`.
    fn load_sprites(
        &self,
        character: Character,
        gamestyle: Gamestyle,
    ) -> Result<SpriteSet, AssetError>;

    /// Flag thumbnail, or `None` if there is no art for the country.
    fn load_flag(&self, country: CountryCode) -> Result<Option<RgbaImage>, AssetError>;

    /// Everything needed to render the players in `store`.
    fn load_level(
        &self,
        store: &TrajectoryStore,
        gamestyle: Gamestyle,
    ) -> Result<LevelAssets, AssetError> {
        let (overworld, subworld) = self.load_backgrounds(store.level_id())?;
        let mut assets = LevelAssets::new(overworld, subworld);

        for character in Character::ALL {
            if store.players().iter().any(|p| p.character == character) {
                let sprites = self.load_sprites(character, gamestyle)?;
                if sprites.loaded() == 0 {
                    warn!("No sprites for {} in {}", character.dir_name(), gamestyle);
                }
                assets.set_sprites(character, sprites);
            }
        }

        for player in store.players() {
            let Some(country) = player.country else {
                continue;
            };
            if assets.flag(country).is_some() {
                continue;
            }
            match self.load_flag(country)? {
                Some(flag) => assets.insert_flag(country, flag),
                None => warn!("No flag for country {}", country),
            }
        }

        Ok(assets)
    }
}

/// Assets laid out on disk:
///
/// ```text
/// levels/<id>.bcd.overworld.png
/// levels/<id>.bcd.subworld.png              (optional)
/// players/<character>/<gamestyle>/<state>.png
/// players/<character>/<state>.png           (fallback)
/// flags/<CC>.png
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
    scale: u32,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>, scale: u32) -> Self {
        Self {
            root: root.into(),
            scale: scale.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn level_path(&self, level_id: u32, space: &str) -> PathBuf {
        self.root
            .join("levels")
            .join(format!("{}.bcd.{}.png", level_id, space))
    }

    fn upscale(&self, image: RgbaImage) -> RgbaImage {
        if self.scale == 1 {
            return image;
        }
        let (w, h) = image.dimensions();
        imageops::resize(&image, w * self.scale, h * self.scale, FilterType::Nearest)
    }
}

impl AssetLoader for DirectoryAssets {
    fn load_backgrounds(
        &self,
        level_id: u32,
    ) -> Result<(RgbaImage, Option<RgbaImage>), AssetError> {
        let overworld = open_rgba(&self.level_path(level_id, "overworld"))?;

        let subworld_path = self.level_path(level_id, "subworld");
        let subworld = if subworld_path.exists() {
            Some(self.upscale(open_rgba(&subworld_path)?))
        } else {
            debug!("Level {} has no subworld image", level_id);
            None
        };

        Ok((self.upscale(overworld), subworld))
    }

    fn load_sprites(
        &self,
        character: Character,
        gamestyle: Gamestyle,
    ) -> Result<SpriteSet, AssetError> {
        let base = self.root.join("players").join(character.dir_name());
        let styled = base.join(gamestyle.dir_name());
        let mut sprites = SpriteSet::default();

        for state in 0..PLAYER_STATE_COUNT as u8 {
            let file = format!("{}.png", state);
            let path = [styled.join(&file), base.join(&file)]
                .into_iter()
                .find(|p| p.exists());
            if let Some(path) = path {
                let image = self.upscale(open_rgba(&path)?);
                sprites.set(state, Sprite::new(image));
            }
        }

        Ok(sprites)
    }

    fn load_flag(&self, country: CountryCode) -> Result<Option<RgbaImage>, AssetError> {
        let path = self.root.join("flags").join(format!("{}.png", country));
        if !path.exists() {
            return Ok(None);
        }
        let flag = open_rgba(&path)?;
        Ok(Some(imageops::resize(
            &flag,
            FLAG_WIDTH * self.scale,
            FLAG_HEIGHT * self.scale,
            FilterType::Nearest,
        )))
    }
}

/// Decode any supported image file to RGBA.
pub fn open_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    if !path.exists() {
        return Err(AssetError::Missing {
            path: path.to_path_buf(),
        });
    }
    let image = image::open(path).map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

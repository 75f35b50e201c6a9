//! Centralized constants for the renderer.
//!
//! Pixel lengths are in unscaled units; the compositor multiplies them by
//! the configured scale factor.

/// Game ticks per second.
pub const GAME_TICKS_PER_SECOND: u32 = 60;

/// The game samples a ghost position every 4 ticks.
pub const TICKS_PER_SAMPLE: u32 = 4;

/// Recorded samples per second of game time.
pub const SAMPLES_PER_SECOND: u32 = GAME_TICKS_PER_SECOND / TICKS_PER_SAMPLE;

/// Number of sprite/animation states a frame can encode.
pub const PLAYER_STATE_COUNT: usize = 16;

/// Number of selectable characters.
pub const CHARACTER_COUNT: usize = 4;

/// Chroma-key fill used for the leaderboard and chart panels (RGB).
///
/// Downstream keying matches this exact value.
pub const CHROMA_KEY_RGB: [u8; 3] = [190, 0, 255];

/// Reserved heat-line colour for the fastest finishers (RGB).
pub const TOP_RUN_RGB: [u8; 3] = [128, 206, 255];

/// Leaderboard rows shown at once.
pub const DEFAULT_LEADERBOARD_ROWS: usize = 36;

/// Number of fastest finishers drawn in the reserved heat-line colour.
pub const DEFAULT_TOP_HIGHLIGHT: usize = 10;

/// Heat-line exponent used for levels without a tuned constant.
pub const DEFAULT_LINE_EXPONENT: f64 = 0.025;

/// Horizontal offset, in tiles, between replay space and the level image.
pub const LEVEL_OFFSET_X: f32 = 8.0 * 13.0;

/// Vertical offset, in tiles, between replay space and the level image.
pub const LEVEL_OFFSET_Y: f32 = 16.0 * 6.0;

/// Margin above the overworld image.
pub const OVERWORLD_TOP: u32 = 120;

/// Gap between the top of the canvas and the subworld image, not counting
/// the overworld image itself.
pub const SUBWORLD_TOP: u32 = 360;

/// Left edge of the leaderboard panel.
pub const LEADERBOARD_X: u32 = 3840;

/// Width of the leaderboard panel.
pub const LEADERBOARD_WIDTH: u32 = 800;

/// Height of the leaderboard panel.
pub const LEADERBOARD_HEIGHT: u32 = 3000;

/// Height of the country chart panel under the level.
pub const COUNTRY_CHART_HEIGHT: u32 = 500;

/// Vertical pitch of one leaderboard row.
pub const LEADERBOARD_ROW_PITCH: u32 = 72;

/// Side length of an avatar thumbnail.
pub const AVATAR_SIZE: u32 = 48;

/// Flag thumbnail size.
pub const FLAG_WIDTH: u32 = 72;
pub const FLAG_HEIGHT: u32 = 48;

/// Horizontal slot taken by one bar in the country chart.
pub const COUNTRY_BAR_SLOT: u32 = 54;

/// Width of one bar in the country chart.
pub const COUNTRY_BAR_WIDTH: u32 = 36;

/// Maximum simultaneous avatar downloads.
pub const MAX_PARALLEL_DOWNLOADS: usize = 50;

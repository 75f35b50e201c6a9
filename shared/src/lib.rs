//! Shared types for the ghostreel replay renderer.
//!
//! Everything in here is immutable, process-wide configuration: per-level
//! lookup tables, the country-code list, render constants and the small
//! value types (characters, gamestyles, country codes) that both the core
//! and the CLI speak.

pub mod constants;
pub mod country;
pub mod levels;
pub mod time;

pub use country::{CountryCode, CountryCodeError};
pub use levels::{Character, Gamestyle, LevelInfo, level_info};
pub use time::format_race_time;

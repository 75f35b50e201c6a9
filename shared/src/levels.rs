//! Per-level lookup tables.
//!
//! The renderer only knows a handful of hand-tuned levels. Each entry pairs
//! the level's gamestyle (which picks sprite art and enables the balloon
//! rotation states) with the exponent that shapes its heat-line colour ramp.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual theme of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gamestyle {
    Smb1,
    Smb3,
    Smw,
    Nsmbu,
    Sm3dw,
}

impl Gamestyle {
    /// Directory name used for gamestyle-specific sprite art.
    pub fn dir_name(self) -> &'static str {
        match self {
            Gamestyle::Smb1 => "smb1",
            Gamestyle::Smb3 => "smb3",
            Gamestyle::Smw => "smw",
            Gamestyle::Nsmbu => "nsmbu",
            Gamestyle::Sm3dw => "sm3dw",
        }
    }

    /// Player states drawn rotated along the direction of travel instead of
    /// mirrored (the inflated balloon float in SMW).
    pub fn rotating_states(self) -> &'static [u8] {
        match self {
            Gamestyle::Smw => &[13, 14],
            _ => &[],
        }
    }
}

impl fmt::Display for Gamestyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Playable character, as stored at offset 0x14 of a replay blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Character {
    Mario = 0,
    Luigi = 1,
    Toad = 2,
    Toadette = 3,
}

impl Character {
    pub const ALL: [Character; 4] = [
        Character::Mario,
        Character::Luigi,
        Character::Toad,
        Character::Toadette,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Directory name used for this character's sprite art.
    pub fn dir_name(self) -> &'static str {
        match self {
            Character::Mario => "mario",
            Character::Luigi => "luigi",
            Character::Toad => "toad",
            Character::Toadette => "toadette",
        }
    }
}

/// Static metadata for a known level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelInfo {
    pub gamestyle: Gamestyle,
    /// Exponent `c` in the heat-line ramp `(1 - p)^(1/c - 1)`.
    pub line_exponent: f64,
}

const fn info(gamestyle: Gamestyle, line_exponent: f64) -> LevelInfo {
    LevelInfo {
        gamestyle,
        line_exponent,
    }
}

/// Look up a level's metadata by its data id.
pub fn level_info(level_id: u32) -> Option<LevelInfo> {
    use Gamestyle::*;

    let info = match level_id {
        33883306 => info(Smb1, 0.055),
        29234075 => info(Nsmbu, 0.03),
        28460377 => info(Smw, 0.025),
        // Replays for this level use a layout the decoder does not understand.
        27439231 => info(Smb3, 0.025),
        26746705 => info(Smb1, 0.03),
        25984384 => info(Smw, 0.035),
        25459053 => info(Sm3dw, 0.055),
        25045367 => info(Smb1, 0.025),
        24477739 => info(Smb3, 0.035),
        23738173 => info(Nsmbu, 0.017),
        // Same broken layout as 27439231.
        23303835 => info(Smb3, 0.035),
        22587491 => info(Sm3dw, 0.03),
        21858065 => info(Nsmbu, 0.007),
        20182790 => info(Smw, 0.017),
        17110274 => info(Sm3dw, 0.025),
        15675466 => info(Smb3, 0.007),
        14827235 => info(Smw, 0.025),
        14328331 => info(Sm3dw, 0.03),
        13428950 => info(Nsmbu, 0.025),
        12619193 => info(Smb1, 0.025),
        12171034 => info(Nsmbu, 0.0007),
        _ => return None,
    };

    Some(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_level_lookup() {
        let info = level_info(28460377).unwrap();
        assert_eq!(info.gamestyle, Gamestyle::Smw);
        assert!((info.line_exponent - 0.025).abs() < f64::EPSILON);
        assert!(level_info(1).is_none());
    }

    #[test]
    fn only_smw_rotates() {
        assert_eq!(Gamestyle::Smw.rotating_states(), &[13, 14]);
        assert!(Gamestyle::Smb1.rotating_states().is_empty());
    }

    #[test]
    fn character_ids() {
        assert_eq!(Character::from_id(0), Some(Character::Mario));
        assert_eq!(Character::from_id(3), Some(Character::Toadette));
        assert_eq!(Character::from_id(4), None);
        assert_eq!(Character::Toad.index(), 2);
    }
}

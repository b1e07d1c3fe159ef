//! Shared primitive IDs and avatar-package enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque remote avatar identifier (`avtr_...`).
pub type AvatarId = String;
/// Monotonic catalog revision, bumped once per successful mutation.
pub type Revision = u64;

/// Build target of a unity package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Platform {
    /// Desktop build (`standalonewindows`).
    #[serde(rename = "standalonewindows")]
    Pc,
    /// Mobile/Quest build (`android`).
    #[serde(rename = "android")]
    Mobile,
    /// Any other build target.
    #[default]
    #[serde(other)]
    Other,
}

/// Build purpose of a unity package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BuildVariant {
    /// Security-checked build; the one carrying the reported performance rating.
    #[serde(rename = "security")]
    Security,
    /// Standard or unrecognized build purpose.
    #[default]
    #[serde(other)]
    Other,
}

/// Performance rank reported for a package.
///
/// Declaration order is display priority: `Excellent` ranks first and
/// `Unknown` last, so the derived `Ord` is the ranking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum PerformanceRating {
    /// Best rank.
    Excellent,
    /// Second rank.
    Good,
    /// Third rank.
    Medium,
    /// Fourth rank.
    Poor,
    /// Fifth rank.
    VeryPoor,
    /// Explicitly unrated.
    None,
    /// Missing or unrecognized rating.
    #[default]
    #[serde(other)]
    Unknown,
}

impl PerformanceRating {
    /// 1-based display priority (`Excellent` = 1 .. `Unknown` = 7).
    pub fn rank(self) -> u8 {
        match self {
            Self::Excellent => 1,
            Self::Good => 2,
            Self::Medium => 3,
            Self::Poor => 4,
            Self::VeryPoor => 5,
            Self::None => 6,
            Self::Unknown => 7,
        }
    }
}

impl fmt::Display for PerformanceRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Medium => "Medium",
            Self::Poor => "Poor",
            Self::VeryPoor => "VeryPoor",
            Self::None => "None",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

//! Display ordering and search filtering for the catalog.
//!
//! [`compare`] is the single comparator every sorted view goes through.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{avatar::AvatarRecord, types::Platform};

/// Catalog display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortMode {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Mobile-capable avatars first, best mobile rating first.
    PlatformPriority,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort mode {0:?} (expected newest, oldest or platform)")]
pub struct ParseSortModeError(String);

impl FromStr for SortMode {
    type Err = ParseSortModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "latest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "platform" | "quest" | "mobile" => Ok(Self::PlatformPriority),
            _ => Err(ParseSortModeError(s.to_string())),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::PlatformPriority => "platform",
        })
    }
}

/// Total order over avatars for `mode`. `Less` means `a` is shown first.
///
/// Missing timestamps count as the earliest possible time.
pub fn compare(a: &AvatarRecord, b: &AvatarRecord, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Newest => b.created_at.cmp(&a.created_at),
        SortMode::Oldest => a.created_at.cmp(&b.created_at),
        SortMode::PlatformPriority => compare_platform_priority(a, b),
    }
}

fn compare_platform_priority(a: &AvatarRecord, b: &AvatarRecord) -> Ordering {
    let a_mobile = a.supports(Platform::Mobile);
    let b_mobile = b.supports(Platform::Mobile);

    match (a_mobile, b_mobile) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => a
            .security_rating(Platform::Mobile)
            .cmp(&b.security_rating(Platform::Mobile)),
        (false, false) => compare(a, b, SortMode::Newest),
    }
}

/// Stable in-place sort; avatars that compare equal keep their catalog order.
pub fn sort_avatars(avatars: &mut [AvatarRecord], mode: SortMode) {
    avatars.sort_by(|a, b| compare(a, b, mode));
}

/// Case-insensitive substring match on name or author. An empty (or
/// whitespace) term matches everything.
pub fn matches_term(avatar: &AvatarRecord, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    avatar.name.to_lowercase().contains(&term) || avatar.author_name.to_lowercase().contains(&term)
}

//! Avatar domain record, package descriptor, and patch types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{AvatarId, BuildVariant, PerformanceRating, Platform};

/// One platform-specific build of an avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnityPackage {
    /// Build target.
    #[serde(default)]
    pub platform: Platform,
    /// Build purpose.
    #[serde(default)]
    pub variant: BuildVariant,
    /// Reported performance rank.
    #[serde(default, rename = "performanceRating")]
    pub performance_rating: PerformanceRating,
    /// Upload time of this package.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fully materialized catalog entry.
///
/// Field names on the wire follow the remote API, so the same shape is used
/// for gateway responses and for the persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarRecord {
    /// Stable remote identifier.
    pub id: AvatarId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Display name of the uploader.
    #[serde(default, rename = "authorName")]
    pub author_name: String,
    /// Thumbnail image location.
    #[serde(default, rename = "thumbnailImageUrl")]
    pub thumbnail_url: String,
    /// Upload time; absent when the remote value was missing or malformed.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    /// Platform builds in remote order.
    #[serde(default, rename = "unityPackages")]
    pub variants: Vec<UnityPackage>,
}

impl AvatarRecord {
    /// Minimal record with empty display fields.
    pub fn new(id: impl Into<AvatarId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author_name: String::new(),
            thumbnail_url: String::new(),
            created_at: None,
            variants: Vec::new(),
        }
    }

    /// True when any package targets `platform`, whatever its build variant.
    pub fn supports(&self, platform: Platform) -> bool {
        self.variants.iter().any(|p| p.platform == platform)
    }

    /// Most recently created security build for `platform`.
    pub fn latest_security_package(&self, platform: Platform) -> Option<&UnityPackage> {
        self.variants
            .iter()
            .filter(|p| p.platform == platform && p.variant == BuildVariant::Security)
            .max_by(|a, b| a.created_at.cmp(&b.created_at))
    }

    /// Rating of the latest security build for `platform`, or `Unknown`.
    pub fn security_rating(&self, platform: Platform) -> PerformanceRating {
        self.latest_security_package(platform)
            .map(|p| p.performance_rating)
            .unwrap_or(PerformanceRating::Unknown)
    }
}

/// Sparse patch where each `Some` field overwrites the record value.
///
/// The id is intentionally absent: identity never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvatarPatch {
    /// Optional replacement for the display name.
    pub name: Option<String>,
    /// Optional replacement for the author name.
    pub author_name: Option<String>,
    /// Optional replacement for the thumbnail location.
    pub thumbnail_url: Option<String>,
    /// Optional replacement for the upload time.
    pub created_at: Option<Option<DateTime<Utc>>>,
    /// Optional replacement for the package list.
    pub variants: Option<Vec<UnityPackage>>,
}

impl AvatarPatch {
    /// Patch that overwrites every mutable field with `fresh`'s values.
    pub fn refresh_from(fresh: &AvatarRecord) -> Self {
        Self {
            name: Some(fresh.name.clone()),
            author_name: Some(fresh.author_name.clone()),
            thumbnail_url: Some(fresh.thumbnail_url.clone()),
            created_at: Some(fresh.created_at),
            variants: Some(fresh.variants.clone()),
        }
    }

    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies this patch in place to `rec`.
    pub fn apply_to(&self, rec: &mut AvatarRecord) {
        if let Some(v) = &self.name {
            rec.name = v.clone();
        }
        if let Some(v) = &self.author_name {
            rec.author_name = v.clone();
        }
        if let Some(v) = &self.thumbnail_url {
            rec.thumbnail_url = v.clone();
        }
        if let Some(v) = self.created_at {
            rec.created_at = v;
        }
        if let Some(v) = &self.variants {
            rec.variants = v.clone();
        }
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    })
}

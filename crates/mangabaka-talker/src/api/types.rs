//! MangaBaka API v1 response types.
//!
//! These types represent the JSON responses from the MangaBaka API. The
//! provider omits fields freely, so everything it may omit is an explicit
//! `Option`. Raw records are re-serialized into the series cache, so all
//! types derive `Serialize` as well.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response envelope wrapping every endpoint
///
/// `data` is a list of series for the search endpoint and a single series
/// for the by-id endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct MbResponse<T> {
    /// Provider-level status, 200 on success even inside HTTP 200
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pagination: Option<MbPagination>,
    #[serde(default)]
    pub data: Option<T>,
}

/// Pagination cursor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MbPagination {
    /// Total result count across all pages
    pub count: u64,
    pub page: u32,
    pub limit: u32,
    /// Absolute URL of the next page, if any
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// Lifecycle state of a series record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesState {
    Active,
    Merged,
    Deleted,
}

/// Content rating on an ordered permissiveness scale
///
/// The ordering matters: the age filter keeps every rating at or below a
/// configured threshold. An older provider schema used a boolean NSFW flag
/// instead; `content_rating_compat` maps it onto this scale when
/// deserializing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ContentRating {
    #[default]
    Safe,
    Suggestive,
    Erotica,
    Pornographic,
}

impl ContentRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentRating::Safe => "safe",
            ContentRating::Suggestive => "suggestive",
            ContentRating::Erotica => "erotica",
            ContentRating::Pornographic => "pornographic",
        }
    }
}

impl std::fmt::Display for ContentRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentRating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(ContentRating::Safe),
            "suggestive" => Ok(ContentRating::Suggestive),
            "erotica" => Ok(ContentRating::Erotica),
            "pornographic" => Ok(ContentRating::Pornographic),
            _ => Err(anyhow::anyhow!("Invalid content rating: {}", s)),
        }
    }
}

/// Accepts either the current string scheme or the legacy boolean NSFW flag.
///
/// The boolean maps to the lowest rating that is unambiguously NSFW:
/// `true` becomes `erotica`, `false` becomes `safe`.
pub(crate) mod content_rating_compat {
    use super::ContentRating;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Named(ContentRating),
        Nsfw(bool),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ContentRating>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(raw.map(|r| match r {
            Raw::Named(rating) => rating,
            Raw::Nsfw(true) => ContentRating::Erotica,
            Raw::Nsfw(false) => ContentRating::Safe,
        }))
    }
}

/// Work-type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    Manga,
    Novel,
    Manhwa,
    Manhua,
    Oel,
    #[serde(other)]
    Other,
}

impl SeriesType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesType::Manga => "manga",
            SeriesType::Novel => "novel",
            SeriesType::Manhwa => "manhwa",
            SeriesType::Manhua => "manhua",
            SeriesType::Oel => "oel",
            SeriesType::Other => "other",
        }
    }
}

impl std::fmt::Display for SeriesType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SeriesType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manga" => Ok(SeriesType::Manga),
            "novel" => Ok(SeriesType::Novel),
            "manhwa" => Ok(SeriesType::Manhwa),
            "manhua" => Ok(SeriesType::Manhua),
            "oel" => Ok(SeriesType::Oel),
            "other" => Ok(SeriesType::Other),
            _ => Err(anyhow::anyhow!("Invalid series type: {}", s)),
        }
    }
}

/// Cover image URL set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MbImageSet {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
}

/// One alias title in a secondary-title list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MbSecondaryTitle {
    pub title: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// Publisher locale classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MbPublisherKind {
    Original,
    English,
    #[serde(other)]
    Other,
}

/// Publisher entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MbPublisher {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MbPublisherKind,
    #[serde(default)]
    pub note: Option<String>,
}

/// Related-series id lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MbRelationship {
    #[serde(default)]
    pub main_story: Option<Vec<u64>>,
    #[serde(default)]
    pub adaptation: Option<Vec<u64>>,
    #[serde(default)]
    pub prequel: Option<Vec<u64>>,
    #[serde(default)]
    pub sequel: Option<Vec<u64>>,
    #[serde(default)]
    pub side_story: Option<Vec<u64>>,
    #[serde(default)]
    pub spin_off: Option<Vec<u64>>,
    #[serde(default)]
    pub alternative: Option<Vec<u64>>,
    #[serde(default)]
    pub other: Option<Vec<u64>>,
}

/// One raw series record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MbSeries {
    pub id: u64,
    #[serde(default)]
    pub state: Option<SeriesState>,
    #[serde(default)]
    pub merged_with: Option<u64>,

    // Titles
    pub title: String,
    #[serde(default)]
    pub native_title: Option<String>,
    #[serde(default)]
    pub romanized_title: Option<String>,
    /// Language code -> alias titles; both the map and its values may be absent
    #[serde(default)]
    pub secondary_titles: Option<HashMap<String, Option<Vec<MbSecondaryTitle>>>>,

    // Presentation
    #[serde(default)]
    pub cover: Option<MbImageSet>,
    #[serde(default)]
    pub description: Option<String>,

    // People
    #[serde(default)]
    pub authors: Option<Vec<String>>,
    #[serde(default)]
    pub artists: Option<Vec<String>>,

    // Publication
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_licensed: Option<bool>,
    #[serde(default)]
    pub has_anime: Option<bool>,
    #[serde(default)]
    pub publishers: Option<Vec<MbPublisher>>,

    // Classification
    #[serde(default, deserialize_with = "content_rating_compat::deserialize")]
    pub content_rating: Option<ContentRating>,
    #[serde(rename = "type", default)]
    pub kind: Option<SeriesType>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    // Ratings and counts
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub final_volume: Option<String>,
    #[serde(default)]
    pub final_chapter: Option<String>,
    #[serde(default)]
    pub total_chapters: Option<String>,

    // Links and bookkeeping
    #[serde(default)]
    pub links: Option<Vec<String>>,
    #[serde(default)]
    pub last_updated_at: Option<String>,
    #[serde(default)]
    pub relationships: Option<MbRelationship>,
}

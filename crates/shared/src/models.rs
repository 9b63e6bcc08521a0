//! Generic comic metadata model.
//!
//! These are the host-side structures every talker normalizes provider
//! records into. They carry no provider-specific fields; anything a
//! provider cannot supply stays `None`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifies which talker produced a metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataOrigin {
    /// Talker id, e.g. "mangabaka"
    pub id: String,
    /// Human-readable talker name
    pub name: String,
}

impl MetadataOrigin {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A single credited person on a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub person: String,
    pub role: String,
}

/// One series as presented in search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComicSeries {
    /// Provider series id
    pub id: String,
    /// Display name
    pub name: String,
    /// Alternate titles (native, romanized, per-language aliases)
    pub aliases: HashSet<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub start_year: Option<i32>,
    pub count_of_issues: Option<u32>,
    pub count_of_volumes: Option<u32>,
    /// Work type tag (manga, manhwa, ...)
    pub format: Option<String>,
    pub image_url: Option<String>,
}

/// Full metadata record for a tagged series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericMetadata {
    pub data_origin: Option<MetadataOrigin>,
    pub series_id: Option<String>,
    pub issue_id: Option<String>,

    // Naming
    pub series: Option<String>,
    pub series_aliases: HashSet<String>,

    // Presentation
    pub cover_image: Option<String>,
    pub description: Option<String>,

    // Publication
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub volume: Option<i32>,
    pub count_of_issues: Option<u32>,
    pub count_of_volumes: Option<u32>,
    pub manga: bool,

    // Classification
    pub genres: HashSet<String>,
    pub tags: HashSet<String>,
    pub maturity_rating: Option<String>,
    pub critical_rating: Option<f64>,

    // People and links
    pub credits: Vec<Credit>,
    pub web_links: Vec<String>,
}

impl GenericMetadata {
    /// Add a credited person, skipping exact duplicates
    pub fn add_credit(&mut self, person: impl Into<String>, role: impl Into<String>) {
        let credit = Credit {
            person: person.into(),
            role: role.into(),
        };
        if !self.credits.contains(&credit) {
            self.credits.push(credit);
        }
    }
}

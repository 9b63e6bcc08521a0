//! Result filters applied to raw series records.
//!
//! Three independent, pure filters, always applied in the same order:
//! content rating, then work type, then dojin. They run over freshly
//! fetched and cache-loaded result sets alike, and never influence what
//! gets cached.

use crate::api::types::{ContentRating, MbSeries, SeriesType};

/// Keep records rated at or below the configured threshold.
///
/// Records with no rating are treated as `safe` and kept.
pub fn filter_content_rating(records: Vec<MbSeries>, max_rating: ContentRating) -> Vec<MbSeries> {
    records
        .into_iter()
        .filter(|series| series.content_rating.unwrap_or_default() <= max_rating)
        .collect()
}

/// Keep only records whose work type matches exactly
pub fn filter_type(records: Vec<MbSeries>, kind: SeriesType) -> Vec<MbSeries> {
    records
        .into_iter()
        .filter(|series| series.kind == Some(kind))
        .collect()
}

/// Drop records tagged with the doujinshi genre.
///
/// Records with no genre data are kept: absence of genre data is not
/// evidence that a work is dojin.
pub fn filter_dojin(records: Vec<MbSeries>) -> Vec<MbSeries> {
    records
        .into_iter()
        .filter(|series| match &series.genres {
            Some(genres) => !genres.iter().any(|g| g.eq_ignore_ascii_case("doujinshi")),
            None => true,
        })
        .collect()
}

/// The configured filter set, applied in fixed order
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    /// Maximum content rating to keep
    pub max_rating: ContentRating,
    /// Keep only this work type, when set
    pub kind: Option<SeriesType>,
    /// Drop doujinshi-tagged records
    pub drop_dojin: bool,
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self {
            max_rating: ContentRating::Safe,
            kind: None,
            drop_dojin: true,
        }
    }
}

impl FilterPipeline {
    /// Apply all configured filters, preserving record order
    pub fn apply(&self, records: Vec<MbSeries>) -> Vec<MbSeries> {
        let mut records = filter_content_rating(records, self.max_rating);
        if let Some(kind) = self.kind {
            records = filter_type(records, kind);
        }
        if self.drop_dojin {
            records = filter_dojin(records);
        }
        records
    }
}

//! MangaBaka search and fetch orchestration.
//!
//! Composes the rate-limited client, the series cache and the filter
//! pipeline: cache-first searches, sequential pagination with an early
//! relevance stop, post-fetch cache writes, and normalization into the
//! host metadata model.

use crate::api::types::{ContentRating, MbPublisherKind, MbResponse, MbSeries};
use crate::api::{MangaBakaClient, RateLimitCallback};
use crate::error::{data_code, network_code, TalkerError};
use crate::filters::FilterPipeline;
use anyhow::{Context, Result};
use reqwest::Url;
use shared::cache::{CachedSeries, SeriesCache};
use shared::models::{ComicSeries, GenericMetadata, MetadataOrigin};
use shared::utils;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Talker id used as the cache source key
pub const TALKER_ID: &str = "mangabaka";
/// Human-readable talker name
pub const TALKER_NAME: &str = "MangaBaka";

/// Results requested per search page
const SEARCH_PAGE_LIMIT: u32 = 50;
/// Hard cap on pages fetched for one search
const MAX_SEARCH_PAGES: u32 = 6;
/// Known-good series id probed by `check_status`
const STATUS_PROBE_SERIES_ID: u64 = 10023;

/// Default fuzzy-match threshold for the pagination early stop
pub const DEFAULT_SERIES_MATCH_THRESHOLD: u32 = 90;

/// Talker behavior configured by the host
#[derive(Debug, Clone)]
pub struct MangaBakaSettings {
    /// API base URL
    pub base_url: String,
    /// Result filters
    pub filters: FilterPipeline,
    /// Prefer the original publisher over the English-language one
    pub use_original_publisher: bool,
    /// Report the series start year as the volume number
    pub use_series_start_as_volume: bool,
}

impl Default for MangaBakaSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.mangabaka.dev/v1/".to_string(),
            filters: FilterPipeline::default(),
            use_original_publisher: false,
            use_series_start_as_volume: false,
        }
    }
}

impl MangaBakaSettings {
    /// Build settings from the host configuration section
    pub fn from_config(config: &shared::config::MangaBakaConfig) -> Result<Self> {
        let max_rating: ContentRating = config
            .age_filter
            .parse()
            .with_context(|| format!("Invalid age filter: {}", config.age_filter))?;

        let kind = if config.filter_type.is_empty() {
            None
        } else {
            Some(
                config
                    .filter_type
                    .parse()
                    .with_context(|| format!("Invalid type filter: {}", config.filter_type))?,
            )
        };

        let mut base_url = config.base_url.clone();
        if base_url.is_empty() {
            base_url = Self::default().base_url;
        }

        Ok(Self {
            base_url,
            filters: FilterPipeline {
                max_rating,
                kind,
                drop_dojin: config.filter_dojin,
            },
            use_original_publisher: config.use_original_publisher,
            use_series_start_as_volume: config.use_series_start_as_volume,
        })
    }
}

/// Per-search options
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Skip the cache read and re-fetch from the network
    pub refresh_cache: bool,
    /// Exact-match mode: bypasses the cache and the early-stop heuristic
    pub literal: bool,
    /// Fuzzy-match threshold for the early stop (0-100)
    pub series_match_threshold: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            refresh_cache: false,
            literal: false,
            series_match_threshold: DEFAULT_SERIES_MATCH_THRESHOLD,
        }
    }
}

/// MangaBaka metadata talker
pub struct MangaBakaTalker {
    client: MangaBakaClient,
    cache: Arc<dyn SeriesCache>,
    settings: MangaBakaSettings,
}

impl MangaBakaTalker {
    pub fn new(
        client: MangaBakaClient,
        cache: Arc<dyn SeriesCache>,
        settings: MangaBakaSettings,
    ) -> Self {
        Self {
            client,
            cache,
            settings,
        }
    }

    /// Number of HTTP requests made since this talker was created
    pub fn total_requests(&self) -> u64 {
        self.client.total_requests()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Probe the configured base URL with a known series id
    pub async fn check_status(&self) -> (String, bool) {
        let url = self.endpoint(&format!("series/{}", STATUS_PROBE_SERIES_ID));
        match self
            .client
            .get_json::<MbSeries>(&url, &[], &CancellationToken::new(), None)
            .await
        {
            Ok(_) => ("The URL is valid".to_string(), true),
            Err(e) => (format!("Failed to connect to the URL! {}", e), false),
        }
    }

    /// Search for series by name.
    ///
    /// Serves repeated searches from the cache unless refreshing or in
    /// literal mode. Fetches pages sequentially, stopping at the page cap
    /// or as soon as relevance drops below the match threshold, then
    /// caches the full unfiltered set before filtering and normalizing.
    pub async fn search_for_series(
        &self,
        series_name: &str,
        options: &SearchOptions,
        cancel: &CancellationToken,
        on_rate_limit: Option<&RateLimitCallback>,
    ) -> Result<Vec<ComicSeries>, TalkerError> {
        info!(name = series_name, "MangaBaka searching");

        // We might have done this same search recently; literal searches
        // always go online.
        if !options.refresh_cache && !options.literal {
            let cached = self
                .cache
                .get_search_results(TALKER_ID, series_name)
                .map_err(cache_error)?;

            if !cached.is_empty() {
                debug!(rows = cached.len(), "Serving search from cache");
                let records = cached
                    .iter()
                    .map(|(row, _)| decode_record(&row.data))
                    .collect::<Result<Vec<_>, _>>()?;
                let filtered = self.settings.filters.apply(records);
                return Ok(filtered.iter().map(|s| self.format_series(s)).collect());
            }
        }

        let mut params: Vec<(String, String)> = vec![
            ("q".to_string(), series_name.to_string()),
            ("page".to_string(), "1".to_string()),
            ("limit".to_string(), SEARCH_PAGE_LIMIT.to_string()),
        ];
        for rating in [
            ContentRating::Safe,
            ContentRating::Suggestive,
            ContentRating::Erotica,
            ContentRating::Pornographic,
        ] {
            params.push(("content_rating".to_string(), rating.as_str().to_string()));
        }

        let mut response: MbResponse<Vec<MbSeries>> = self
            .client
            .get_json(&self.endpoint("series/search"), &params, cancel, on_rate_limit)
            .await?;
        let mut current_page = take_data(&mut response)?;

        if let Some(pagination) = &response.pagination {
            debug!(
                page = pagination.page,
                fetched = current_page.len(),
                total = pagination.count,
                "Search page fetched"
            );
        }

        let mut search_results: Vec<MbSeries> = current_page.clone();
        let mut pages_fetched: u32 = 1;

        // 1. Don't fetch more than a sane number of pages. The cap counts
        //    our own requests, not the page number the provider echoes.
        // 2. In non-literal mode, halt once any result on the current page
        //    falls below the match threshold. Relevance degrades across
        //    pages on this API, so nothing useful follows.
        while let Some(next_url) = response.pagination.as_ref().and_then(|p| p.next.clone()) {
            if pages_fetched >= MAX_SEARCH_PAGES {
                debug!(pages_fetched, "Reached page cap, stopping pagination");
                break;
            }

            if !options.literal {
                let stop_searching = current_page.iter().any(|series| {
                    !utils::titles_match(series_name, &series.title, options.series_match_threshold)
                });
                if stop_searching {
                    debug!("Relevance fell below threshold, stopping pagination");
                    break;
                }
            }

            if cancel.is_cancelled() {
                return Err(TalkerError::network(network_code::GENERIC, "search cancelled"));
            }

            response = self.client.get_json(&next_url, &[], cancel, on_rate_limit).await?;
            current_page = take_data(&mut response)?;
            search_results.extend(current_page.iter().cloned());
            pages_fetched += 1;
        }

        // Cache the raw accumulated set. It's considered complete for our
        // purposes; filters never affect what is cached.
        let cache_rows = search_results
            .iter()
            .map(encode_record)
            .collect::<Result<Vec<_>, _>>()?;
        self.cache
            .add_search_results(TALKER_ID, series_name, &cache_rows, true)
            .map_err(cache_error)?;

        let filtered = self.settings.filters.apply(search_results);
        info!(results = filtered.len(), "MangaBaka search complete");

        Ok(filtered.iter().map(|s| self.format_series(s)).collect())
    }

    /// Fetch one series as a search-style record
    pub async fn fetch_series(
        &self,
        series_id: u64,
        cancel: &CancellationToken,
        on_rate_limit: Option<&RateLimitCallback>,
    ) -> Result<ComicSeries, TalkerError> {
        let series = self.fetch_series_raw(series_id, cancel, on_rate_limit).await?;
        Ok(self.format_series(&series))
    }

    /// Fetch one series as full host metadata
    pub async fn fetch_comic_data(
        &self,
        series_id: u64,
        cancel: &CancellationToken,
        on_rate_limit: Option<&RateLimitCallback>,
    ) -> Result<GenericMetadata, TalkerError> {
        let series = self.fetch_series_raw(series_id, cancel, on_rate_limit).await?;
        Ok(self.map_series_to_metadata(&series))
    }

    /// Fetch full metadata for a list of series ids.
    ///
    /// MangaBaka has no issue-level data; each series maps to exactly one
    /// metadata record.
    pub async fn fetch_issues_by_series(
        &self,
        series_ids: &[u64],
        cancel: &CancellationToken,
        on_rate_limit: Option<&RateLimitCallback>,
    ) -> Result<Vec<GenericMetadata>, TalkerError> {
        let mut records = Vec::with_capacity(series_ids.len());
        for &series_id in series_ids {
            let series = self.fetch_series_raw(series_id, cancel, on_rate_limit).await?;
            records.push(self.map_series_to_metadata(&series));
        }
        Ok(records)
    }

    async fn fetch_series_raw(
        &self,
        series_id: u64,
        cancel: &CancellationToken,
        on_rate_limit: Option<&RateLimitCallback>,
    ) -> Result<MbSeries, TalkerError> {
        // Should almost always have the data cached from a prior search
        if let Some((row, complete)) = self
            .cache
            .get_series_info(TALKER_ID, &series_id.to_string())
            .map_err(cache_error)?
        {
            if complete {
                debug!(series_id, "Serving series from cache");
                return decode_record(&row.data);
            }
        }

        let url = self.endpoint(&format!("series/{}", series_id));
        let mut response: MbResponse<MbSeries> =
            self.client.get_json(&url, &[], cancel, on_rate_limit).await?;
        let series = take_data(&mut response)?;

        let row = encode_record(&series)?;
        self.cache
            .add_series_info(TALKER_ID, &row, true)
            .map_err(cache_error)?;

        Ok(series)
    }

    fn format_series(&self, series: &MbSeries) -> ComicSeries {
        ComicSeries {
            id: series.id.to_string(),
            name: series.title.clone(),
            aliases: collect_aliases(series),
            description: series.description.clone(),
            publisher: self.select_publisher(series),
            start_year: series.year,
            count_of_issues: utils::xlate_int(series.total_chapters.as_deref()),
            count_of_volumes: utils::xlate_int(series.final_volume.as_deref()),
            format: series.kind.map(|k| k.to_string()),
            image_url: series.cover.as_ref().and_then(|c| c.default.clone()),
        }
    }

    fn map_series_to_metadata(&self, series: &MbSeries) -> GenericMetadata {
        let mut md = GenericMetadata {
            data_origin: Some(MetadataOrigin::new(TALKER_ID, TALKER_NAME)),
            series_id: Some(series.id.to_string()),
            issue_id: Some(series.id.to_string()),
            series: Some(series.title.clone()),
            series_aliases: collect_aliases(series),
            cover_image: series.cover.as_ref().and_then(|c| c.default.clone()),
            publisher: self.select_publisher(series),
            ..GenericMetadata::default()
        };

        if let Some(authors) = &series.authors {
            for author in authors {
                md.add_credit(author.clone(), "Writer");
            }
        }
        if let Some(artists) = &series.artists {
            for artist in artists {
                md.add_credit(artist.clone(), "Artist");
            }
        }

        md.manga = series.kind == Some(crate::api::types::SeriesType::Manga);

        if let Some(genres) = &series.genres {
            md.genres.extend(genres.iter().cloned());
        }
        if let Some(tags) = &series.tags {
            md.tags.extend(tags.iter().cloned());
        }

        md.maturity_rating = series.content_rating.map(maturity_label);
        md.critical_rating = series.rating.map(|r| r / 2.0);

        md.count_of_volumes = utils::xlate_int(series.final_volume.as_deref());
        md.count_of_issues = utils::xlate_int(series.final_chapter.as_deref());
        md.year = series.year;
        md.description = series.description.clone();

        if let Some(links) = &series.links {
            md.web_links = links
                .iter()
                .filter(|link| Url::parse(link).is_ok())
                .cloned()
                .collect();
        }

        if self.settings.use_series_start_as_volume {
            md.volume = md.year;
        }

        md
    }

    fn select_publisher(&self, series: &MbSeries) -> Option<String> {
        let publishers = series.publishers.as_ref()?;
        let wanted = if self.settings.use_original_publisher {
            MbPublisherKind::Original
        } else {
            MbPublisherKind::English
        };

        let names: Vec<&str> = publishers
            .iter()
            .filter(|p| p.kind == wanted)
            .map(|p| p.name.as_str())
            .collect();

        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }
}

/// Native, romanized and per-language secondary titles as one alias set
fn collect_aliases(series: &MbSeries) -> HashSet<String> {
    let mut aliases = HashSet::new();
    if let Some(native) = &series.native_title {
        aliases.insert(native.clone());
    }
    if let Some(romanized) = &series.romanized_title {
        aliases.insert(romanized.clone());
    }
    if let Some(secondary) = &series.secondary_titles {
        for titles in secondary.values().flatten() {
            for alias in titles {
                aliases.insert(alias.title.clone());
            }
        }
    }
    aliases
}

fn maturity_label(rating: ContentRating) -> String {
    match rating {
        ContentRating::Safe => "Safe",
        ContentRating::Suggestive => "Suggestive",
        ContentRating::Erotica => "Erotica",
        ContentRating::Pornographic => "Pornographic",
    }
    .to_string()
}

fn cache_error(e: anyhow::Error) -> TalkerError {
    TalkerError::data(data_code::CACHE, e.to_string())
}

fn decode_record(data: &[u8]) -> Result<MbSeries, TalkerError> {
    serde_json::from_slice(data)
        .map_err(|e| TalkerError::data(data_code::CACHE, format!("corrupt cached record: {}", e)))
}

fn encode_record(series: &MbSeries) -> Result<CachedSeries, TalkerError> {
    let data = serde_json::to_vec(series)
        .map_err(|e| TalkerError::data(data_code::SCHEMA, format!("unserializable record: {}", e)))?;
    Ok(CachedSeries::new(series.id.to_string(), data))
}

fn take_data<T>(response: &mut MbResponse<T>) -> Result<T, TalkerError> {
    response
        .data
        .take()
        .ok_or_else(|| TalkerError::data(data_code::SCHEMA, "response carried no data"))
}

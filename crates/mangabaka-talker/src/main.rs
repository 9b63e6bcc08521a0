//! MangaBaka talker CLI application.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mangabaka_talker::api::RateLimitCallback;
use mangabaka_talker::talker::DEFAULT_SERIES_MATCH_THRESHOLD;
use mangabaka_talker::{MangaBakaClient, MangaBakaSettings, MangaBakaTalker, SearchOptions};
use shared::{Config, SqliteCache};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("mangabaka-talker/", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for series by name
    Search {
        /// Series name to search for
        name: String,

        /// Skip the cache and re-fetch from the network
        #[arg(long)]
        refresh_cache: bool,

        /// Exact-match mode: fetch every result page
        #[arg(long)]
        literal: bool,

        /// Fuzzy-match threshold for the pagination early stop (0-100)
        #[arg(long, default_value_t = DEFAULT_SERIES_MATCH_THRESHOLD)]
        threshold: u32,
    },

    /// Fetch full metadata for one or more series ids
    Fetch {
        /// Series ids
        #[arg(required = true)]
        series_ids: Vec<u64>,
    },

    /// Check that the configured base URL answers
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    shared::logging::init(shared::LogConfig {
        log_dir: config.log_dir().to_string_lossy().to_string(),
        component: "mangabaka-talker".to_string(),
        default_level: log_level,
        console: true,
        file: true,
        json_format: false,
    })?;

    info!("MangaBaka talker starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    // Initialize cache. A disabled cache still satisfies the talker's
    // contract through a throwaway in-memory database.
    let cache = if config.mangabaka.cache.enabled {
        let cache_path = config.cache_path();
        if let Some(parent) = cache_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
        info!(cache_path = %cache_path.display(), "Opening series cache");
        Arc::new(SqliteCache::open(&cache_path).context("Failed to open series cache")?)
    } else {
        Arc::new(SqliteCache::open_in_memory().context("Failed to open series cache")?)
    };

    // Initialize API client and talker
    let client = MangaBakaClient::new(USER_AGENT, config.mangabaka.rate_limit.requests_per_minute)
        .context("Failed to create MangaBaka client")?;
    let settings =
        MangaBakaSettings::from_config(&config.mangabaka).context("Invalid talker settings")?;
    let talker = MangaBakaTalker::new(client, cache, settings);

    // Cancel in-flight work on Ctrl-C
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            signal_cancel.cancel();
        }
    });

    let on_rate_limit: RateLimitCallback = Arc::new(|wait| {
        warn!(wait_secs = wait.as_secs_f64(), "Rate limited, waiting");
    });

    match args.command {
        Commands::Search {
            name,
            refresh_cache,
            literal,
            threshold,
        } => {
            let options = SearchOptions {
                refresh_cache,
                literal,
                series_match_threshold: threshold,
            };
            let results = talker
                .search_for_series(&name, &options, &cancel, Some(&on_rate_limit))
                .await
                .context("Search failed")?;

            info!(results = results.len(), requests = talker.total_requests(), "Search complete");
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Commands::Fetch { series_ids } => {
            let records = talker
                .fetch_issues_by_series(&series_ids, &cancel, Some(&on_rate_limit))
                .await
                .context("Fetch failed")?;

            info!(records = records.len(), requests = talker.total_requests(), "Fetch complete");
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Commands::Check => {
            let (message, valid) = talker.check_status().await;
            if valid {
                info!("{}", message);
            } else {
                warn!("{}", message);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

//! Host-facing provider
//!
//! Ties the refiner, the site scraper and the normalizer together behind
//! the fixed contract the media-search host expects.

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::log::{Diagnostics, TracingDiagnostics};
use crate::normalize::{info_hash_from_magnet, to_anime_torrent, TitleInfo};
use crate::refine::{candidates, episode_marker, SearchContext};
use crate::scrapers::{HttpFetch, IlCorsaroNero, ReqwestFetch, TableLayout};
use crate::types::{
    AnimeTorrent, ProviderSettings, ProviderType, RawTorrent, SearchOptions, SmartSearchFilter,
    SmartSearchOptions,
};

const SOURCE: &str = "provider";

static TARGET_SEASON: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)stagione (\d+)").unwrap(),
        Regex::new(r"(?i)season (\d+)").unwrap(),
        Regex::new(r"(?i)s(\d+)").unwrap(),
    ]
});

/// Operations a torrent search provider offers the host
#[async_trait]
pub trait TorrentProvider: Send + Sync {
    fn settings(&self) -> ProviderSettings;

    async fn search(&self, opts: &SearchOptions) -> Vec<AnimeTorrent>;

    async fn smart_search(&self, opts: &SmartSearchOptions) -> Vec<AnimeTorrent>;

    /// Lowercase hex info hash, or empty when it cannot be resolved
    async fn get_torrent_info_hash(&self, torrent: &AnimeTorrent) -> String;

    /// Magnet link; fails when none can be found
    async fn get_torrent_magnet_link(&self, torrent: &AnimeTorrent) -> Result<String>;
}

/// Season number a free-text query asks for ("stagione 2", "season 2", "s2")
pub fn target_season(query: &str) -> Option<i32> {
    TARGET_SEASON
        .iter()
        .find_map(|p| p.captures(query))
        .and_then(|caps| caps[1].parse().ok())
}

/// Keep the items matching `pred`, unless that would leave nothing
fn filter_or_keep<T>(items: Vec<T>, pred: impl Fn(&T) -> bool) -> (Vec<T>, bool) {
    if !items.iter().any(&pred) {
        return (items, false);
    }
    (items.into_iter().filter(|i| pred(i)).collect(), true)
}

pub struct Provider {
    site: IlCorsaroNero,
    diag: Arc<dyn Diagnostics>,
}

impl Provider {
    /// reqwest transport, `tracing` diagnostics
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = Arc::new(ReqwestFetch::new(&config)?);
        Ok(Self::with_parts(config, http, Arc::new(TracingDiagnostics)))
    }

    pub fn with_parts(config: ProviderConfig, http: Arc<dyn HttpFetch>, diag: Arc<dyn Diagnostics>) -> Self {
        Self {
            site: IlCorsaroNero::new(config, http, diag.clone()),
            diag,
        }
    }

    pub fn with_layout(mut self, layout: TableLayout) -> Self {
        self.site = self.site.with_layout(layout);
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        self.site.config()
    }

    /// Try refined candidates in order; first non-empty result wins
    pub async fn fetch_torrents(&self, ctx: &SearchContext<'_>) -> Vec<RawTorrent> {
        for candidate in candidates(ctx) {
            let kind = format!("{:?}", candidate.kind);
            self.diag.info(
                SOURCE,
                "Trying query",
                &[("query", candidate.query.as_str()), ("kind", kind.as_str())],
            );
            let torrents = self.site.perform_search(&candidate.query).await;
            if !torrents.is_empty() {
                return torrents;
            }
        }

        self.diag.info(SOURCE, "No results for any candidate", &[("query", ctx.query)]);
        Vec::new()
    }

    fn map(&self, torrents: &[RawTorrent], confirmed: bool) -> Vec<AnimeTorrent> {
        torrents
            .iter()
            .map(|t| to_anime_torrent(t, confirmed, self.config()))
            .collect()
    }
}

#[async_trait]
impl TorrentProvider for Provider {
    fn settings(&self) -> ProviderSettings {
        ProviderSettings {
            can_smart_search: true,
            smart_search_filters: vec![
                SmartSearchFilter::Batch,
                SmartSearchFilter::EpisodeNumber,
                SmartSearchFilter::Query,
            ],
            supports_adult: false,
            provider_type: ProviderType::Main,
        }
    }

    async fn search(&self, opts: &SearchOptions) -> Vec<AnimeTorrent> {
        let torrents = self.fetch_torrents(&SearchContext::new(&opts.query)).await;
        self.map(&torrents, false)
    }

    async fn smart_search(&self, opts: &SmartSearchOptions) -> Vec<AnimeTorrent> {
        let user_query = opts.query.as_deref().map(str::trim).filter(|q| !q.is_empty());

        let mut query = opts.media.preferred().to_string();
        if let Some(q) = user_query {
            query.push(' ');
            query.push_str(q);
        }
        if let Some(marker) = episode_marker(Some(opts.episode_number), opts.batch) {
            query.push(' ');
            query.push_str(&marker);
        }
        self.diag.info(SOURCE, "Smart search", &[("query", query.as_str())]);

        let ctx = SearchContext {
            query: &query,
            user_query,
            episode_number: Some(opts.episode_number),
            batch: opts.batch,
        };
        let mut torrents = self.fetch_torrents(&ctx).await;

        if opts.batch {
            if let Some(season) = user_query.and_then(target_season).filter(|s| *s >= 1) {
                let (kept, filtered) = filter_or_keep(torrents, |t| {
                    TitleInfo::parse(&t.title).season_number == season
                });
                torrents = kept;
                let season = season.to_string();
                let message = if filtered {
                    "Filtered to season"
                } else {
                    "No torrents for season, keeping all"
                };
                self.diag.info(SOURCE, message, &[("season", season.as_str())]);
            }
        }

        let results = self.map(&torrents, true);

        if opts.batch {
            let (results, filtered) = filter_or_keep(results, |r| r.is_batch);
            if !filtered {
                self.diag.info(SOURCE, "No batch torrents found, returning all results", &[]);
            }
            results
        } else if opts.episode_number > 0 {
            let episode = opts.episode_number;
            let (results, filtered) = filter_or_keep(results, |r| r.episode_number == episode);
            if !filtered {
                let episode = episode.to_string();
                self.diag
                    .info(SOURCE, "No torrents for episode, returning all results", &[("episode", episode.as_str())]);
            }
            results
        } else {
            results
        }
    }

    async fn get_torrent_info_hash(&self, torrent: &AnimeTorrent) -> String {
        if !torrent.info_hash.is_empty() {
            return torrent.info_hash.clone();
        }

        if let Some(magnet) = torrent.magnet_link.as_deref() {
            let hash = info_hash_from_magnet(magnet);
            if !hash.is_empty() {
                return hash;
            }
        }

        match self.site.detail_magnet(&torrent.link).await {
            Ok(magnet) => info_hash_from_magnet(&magnet),
            Err(e) => {
                let reason = e.to_string();
                self.diag.error(
                    SOURCE,
                    "Error fetching info hash",
                    &[("url", torrent.link.as_str()), ("error", reason.as_str())],
                );
                String::new()
            }
        }
    }

    async fn get_torrent_magnet_link(&self, torrent: &AnimeTorrent) -> Result<String> {
        if let Some(magnet) = torrent.magnet_link.as_deref().filter(|m| !m.is_empty()) {
            return Ok(magnet.to_string());
        }

        self.site.detail_magnet(&torrent.link).await.inspect_err(|e| {
            let reason = e.to_string();
            self.diag.error(
                SOURCE,
                "Error fetching magnet link",
                &[("url", torrent.link.as_str()), ("error", reason.as_str())],
            );
        })
    }
}

//! corsaro - ilCorsaroNero search provider for media-search hosts
//!
//! Scrapes the site's search results into [`AnimeTorrent`] records, retrying
//! with progressively simpler queries, and resolves magnet links and info
//! hashes from detail pages on demand.

pub mod config;
pub mod error;
pub mod log;
pub mod normalize;
pub mod provider;
pub mod refine;
pub mod scrapers;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use provider::{Provider, TorrentProvider};
pub use types::{AnimeTorrent, MediaTitles, ProviderSettings, RawTorrent, SearchOptions, SmartSearchOptions};

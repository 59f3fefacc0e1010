//! Records and option types shared across the provider

use serde::{Deserialize, Serialize};

/// One result row as scraped from the search page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTorrent {
    pub title: String,
    /// Detail-page href exactly as found in the markup (usually relative)
    pub link: String,
    /// Size as displayed, e.g. "1.2 GB"
    pub size: String,
    pub seeders: u32,
    pub leechers: u32,
    pub downloads: u32,
    /// Empty when the row carries no magnet
    pub magnet: String,
    /// Empty when the row carries no `.torrent` href
    pub torrent_url: String,
    /// ISO-8601 timestamp
    pub date: String,
}

/// Torrent record in the host's canonical shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeTorrent {
    pub name: String,
    pub date: String,
    /// Size in bytes
    pub size: u64,
    pub formatted_size: String,
    pub seeders: u32,
    pub leechers: u32,
    pub download_count: u32,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub magnet_link: Option<String>,
    /// Lowercase hex, or empty when unknown
    pub info_hash: String,
    pub resolution: String,
    pub is_batch: bool,
    pub is_best_release: bool,
    pub confirmed: bool,
    /// -1 when no episode could be inferred
    pub episode_number: i32,
}

/// Plain free-text search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub query: String,
}

/// Title fields of the media being searched for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaTitles {
    pub english_title: Option<String>,
    pub romaji_title: Option<String>,
    pub synonyms: Vec<String>,
}

impl MediaTitles {
    /// English title, else romanized, else first synonym, else empty
    pub fn preferred(&self) -> &str {
        [self.english_title.as_deref(), self.romaji_title.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .or_else(|| self.synonyms.first().map(String::as_str))
            .unwrap_or("")
    }
}

/// Metadata-driven search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmartSearchOptions {
    pub media: MediaTitles,
    /// Extra free text from the user
    pub query: Option<String>,
    pub batch: bool,
    /// Values <= 0 mean "no specific episode"
    pub episode_number: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SmartSearchFilter {
    Batch,
    EpisodeNumber,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProviderType {
    Main,
}

/// Settings descriptor read by the host's provider registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    pub can_smart_search: bool,
    pub smart_search_filters: Vec<SmartSearchFilter>,
    pub supports_adult: bool,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_title_order() {
        let mut media = MediaTitles {
            english_title: Some("Attack on Titan".to_string()),
            romaji_title: Some("Shingeki no Kyojin".to_string()),
            synonyms: vec!["AoT".to_string()],
        };
        assert_eq!(media.preferred(), "Attack on Titan");

        media.english_title = None;
        assert_eq!(media.preferred(), "Shingeki no Kyojin");

        media.romaji_title = Some(String::new());
        assert_eq!(media.preferred(), "AoT");

        media.synonyms.clear();
        assert_eq!(media.preferred(), "");
    }

    #[test]
    fn test_torrent_serializes_camel_case() {
        let torrent = AnimeTorrent {
            name: "Show".to_string(),
            date: "2024-01-01T00:00:00.000Z".to_string(),
            size: 1024,
            formatted_size: "1 KB".to_string(),
            seeders: 1,
            leechers: 0,
            download_count: 0,
            link: "https://ilcorsaronero.link/1".to_string(),
            download_url: None,
            magnet_link: None,
            info_hash: String::new(),
            resolution: String::new(),
            is_batch: false,
            is_best_release: false,
            confirmed: false,
            episode_number: -1,
        };
        let json = serde_json::to_value(&torrent).unwrap();
        assert_eq!(json["formattedSize"], "1 KB");
        assert_eq!(json["episodeNumber"], -1);
        assert!(json.get("magnetLink").is_none());
    }
}

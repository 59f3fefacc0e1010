//! Provider configuration

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://ilcorsaronero.link";
pub const DEFAULT_SEARCH_PATH: &str = "/search/?q=";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Where and how the provider talks to the site
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Site origin, no trailing slash (e.g. `https://ilcorsaronero.link`)
    pub base_url: String,
    /// Search endpoint path; the url-encoded query is appended verbatim
    pub search_path: String,
    pub user_agent: String,
    /// HTTP client timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 15,
        }
    }
}

impl ProviderConfig {
    /// Default config pointed at another origin (mirrors, test servers)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full search URL for a query
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            self.search_path,
            urlencoding::encode(query)
        )
    }

    /// Prefix the site origin onto a relative path; absolute URLs pass through
    pub fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with("//") {
            let scheme = self.base_url.split_once("://").map_or("https", |(scheme, _)| scheme);
            format!("{}:{}", scheme, href)
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}

//! ilCorsaroNero - Italian torrent site

use scraper::{Html, Selector};
use std::sync::Arc;

use super::table::{find_magnet, parse_search_page, TableLayout};
use super::HttpFetch;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::log::Diagnostics;
use crate::types::RawTorrent;

const SOURCE: &str = "ilcorsaronero";

/// Extract magnet link from detail page HTML
pub fn extract_magnet(html: &str, url: &str) -> Result<String> {
    if let Some(magnet) = find_magnet(html) {
        return Ok(magnet);
    }

    // Fallback: parse with scraper (single-quoted or unusual hrefs)
    let document = Html::parse_document(html);
    if let Ok(magnet_sel) = Selector::parse(r#"a[href^="magnet:"]"#) {
        let href = document
            .select(&magnet_sel)
            .next()
            .and_then(|el| el.value().attr("href"));
        if let Some(href) = href {
            return Ok(href.to_string());
        }
    }

    // Check for deleted torrent
    if html.contains("Eliminato") || html.to_lowercase().contains("non esiste") {
        return Err(ProviderError::Removed(url.to_string()));
    }

    Err(ProviderError::MagnetNotFound(url.to_string()))
}

/// Search and detail-page access for one site origin
pub struct IlCorsaroNero {
    config: ProviderConfig,
    layout: TableLayout,
    http: Arc<dyn HttpFetch>,
    diag: Arc<dyn Diagnostics>,
}

impl IlCorsaroNero {
    pub fn new(config: ProviderConfig, http: Arc<dyn HttpFetch>, diag: Arc<dyn Diagnostics>) -> Self {
        Self {
            config,
            layout: TableLayout::default(),
            http,
            diag,
        }
    }

    /// Swap the table layout (column positions, categories, table id)
    pub fn with_layout(mut self, layout: TableLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// One search request. Any failure is logged and yields no results.
    pub async fn perform_search(&self, query: &str) -> Vec<RawTorrent> {
        let url = self.config.search_url(query);
        self.diag
            .info(SOURCE, "Searching", &[("query", query), ("url", url.as_str())]);

        let html = match self.http.get_text(&url).await {
            Ok(html) => html,
            Err(e) => {
                let reason = e.to_string();
                self.diag.error(
                    SOURCE,
                    "Failed to fetch search page",
                    &[("query", query), ("url", url.as_str()), ("error", reason.as_str())],
                );
                return Vec::new();
            }
        };

        match parse_search_page(&html, &self.layout, self.diag.as_ref()) {
            Ok(torrents) => {
                let count = torrents.len().to_string();
                self.diag
                    .info(SOURCE, "Parsed search page", &[("query", query), ("found", count.as_str())]);
                torrents
            }
            Err(e) => {
                let reason = e.to_string();
                self.diag.warn(
                    SOURCE,
                    "Search page not understood",
                    &[("query", query), ("url", url.as_str()), ("error", reason.as_str())],
                );
                Vec::new()
            }
        }
    }

    /// Fetch a detail page and pull its magnet link
    pub async fn detail_magnet(&self, link: &str) -> Result<String> {
        let url = self.config.absolute_url(link);
        self.diag.debug(SOURCE, "Fetching detail page", &[("url", url.as_str())]);
        let html = self.http.get_text(&url).await?;
        extract_magnet(&html, &url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{MemoryDiagnostics, Severity};
    use crate::testing::{results_page, row, MockFetch};

    const MAGNET: &str = "magnet:?xt=urn:btih:0123456789ABCDEF0123456789ABCDEF01234567&dn=Show";

    fn site(http: MockFetch) -> (IlCorsaroNero, Arc<MockFetch>, Arc<MemoryDiagnostics>) {
        let http = Arc::new(http);
        let diag = Arc::new(MemoryDiagnostics::new());
        let site = IlCorsaroNero::new(ProviderConfig::default(), http.clone(), diag.clone());
        (site, http, diag)
    }

    #[test]
    fn test_extract_magnet_decodes_amp() {
        let html = r#"<div><a class="btn" href="magnet:?xt=urn:btih:ABC&amp;dn=Show&amp;tr=udp://t">Magnet</a></div>"#;
        assert_eq!(
            extract_magnet(html, "u").unwrap(),
            "magnet:?xt=urn:btih:ABC&dn=Show&tr=udp://t"
        );
    }

    #[test]
    fn test_extract_magnet_single_quoted_fallback() {
        let html = "<html><body><a href='magnet:?xt=urn:btih:DEF'>m</a></body></html>";
        assert_eq!(extract_magnet(html, "u").unwrap(), "magnet:?xt=urn:btih:DEF");
    }

    #[test]
    fn test_extract_magnet_missing() {
        let err = extract_magnet("<html><body>Dettagli</body></html>", "https://x/1").unwrap_err();
        assert!(matches!(err, ProviderError::MagnetNotFound(ref u) if u == "https://x/1"));

        let err = extract_magnet("<p>Il torrent non esiste</p>", "https://x/2").unwrap_err();
        assert!(matches!(err, ProviderError::Removed(_)));
    }

    #[tokio::test]
    async fn test_perform_search_parses_page() {
        let page = results_page(&[row("Serie TV", "/123", "Show Name", "12", "3", "1.2 GB", "oggi")]);
        let (site, http, _) = site(MockFetch::new().with_page(
            "https://ilcorsaronero.link/search/?q=Show%20Name",
            page,
        ));

        let torrents = site.perform_search("Show Name").await;
        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].title, "Show Name");
        assert_eq!(http.requests(), vec!["https://ilcorsaronero.link/search/?q=Show%20Name"]);
    }

    #[tokio::test]
    async fn test_perform_search_swallows_http_failure() {
        let (site, _, diag) = site(MockFetch::new().with_status(
            "https://ilcorsaronero.link/search/?q=naruto",
            503,
        ));

        assert!(site.perform_search("naruto").await.is_empty());

        let errors = diag.at_least(Severity::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].get("query"), Some("naruto"));
        assert_eq!(errors[0].get("url"), Some("https://ilcorsaronero.link/search/?q=naruto"));
    }

    #[tokio::test]
    async fn test_perform_search_swallows_parse_failure() {
        let (site, _, diag) = site(MockFetch::new().with_page(
            "https://ilcorsaronero.link/search/?q=naruto",
            "<html><body>Cloudflare</body></html>",
        ));

        assert!(site.perform_search("naruto").await.is_empty());
        assert_eq!(diag.at_least(Severity::Warn).len(), 1);
    }

    #[tokio::test]
    async fn test_detail_magnet_uses_absolute_url() {
        let (site, http, diag) = site(MockFetch::new().with_page(
            "https://ilcorsaronero.link/torrent/9",
            format!(r#"<a href="{}">magnet</a>"#, MAGNET),
        ));

        assert_eq!(site.detail_magnet("/torrent/9").await.unwrap(), MAGNET);
        assert_eq!(http.requests(), vec!["https://ilcorsaronero.link/torrent/9"]);

        let events = diag.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Debug);
        assert_eq!(events[0].get("url"), Some("https://ilcorsaronero.link/torrent/9"));
    }
}

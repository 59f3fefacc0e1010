//! Test doubles and HTML fixtures

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{ProviderError, Result};
use crate::scrapers::HttpFetch;

/// Build a results page around the given `<tr>` rows
pub fn results_page(rows: &[String]) -> String {
    format!(
        r#"<html><body><table id="main_table" class="table"><thead><tr><th>Cat.</th><th>Nome</th><th>Seed</th><th>Leech</th><th>Size</th><th>Data</th><th></th></tr></thead><tbody>{}</tbody></table></body></html>"#,
        rows.concat()
    )
}

/// One seven-column result row
pub fn row(category: &str, href: &str, title: &str, seeders: &str, leechers: &str, size: &str, date: &str) -> String {
    format!(
        r#"<tr><td><span class="badge">{}</span></td><th><a href="{}">{}</a></th><td class="text-green">{}</td><td class="text-red">{}</td><td>{}</td><td>{}</td><td></td></tr>"#,
        category, href, title, seeders, leechers, size, date
    )
}

/// Row that also carries a magnet link
pub fn row_with_magnet(category: &str, href: &str, title: &str, magnet: &str) -> String {
    format!(
        r#"<tr><td>{}</td><th><a href="{}">{}</a></th><td>10</td><td>1</td><td>1.0 GB</td><td>oggi</td><td><a href="{}">magnet</a></td></tr>"#,
        category, href, title, magnet
    )
}

enum Canned {
    Body(String),
    Status(u16),
}

/// `HttpFetch` serving canned responses by exact URL.
///
/// Unknown URLs answer 404. Every request is recorded.
#[derive(Default)]
pub struct MockFetch {
    responses: Mutex<HashMap<String, Canned>>,
    requests: Mutex<Vec<String>>,
}

impl MockFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), Canned::Body(body.into()));
        self
    }

    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), Canned::Status(status));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetch for MockFetch {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());

        match self.responses.lock().unwrap().get(url) {
            Some(Canned::Body(body)) => Ok(body.clone()),
            Some(Canned::Status(status)) => Err(ProviderError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(ProviderError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

//! Site-facing code: HTTP transport, results table extraction, ilCorsaroNero glue

pub mod ilcorsaronero;
pub mod table;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};

pub use ilcorsaronero::IlCorsaroNero;
pub use table::{parse_search_page, TableLayout};

/// Plain GET transport
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Body of a successful response; non-success statuses are errors
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// HTTP client with standard headers
pub fn create_client(config: &ProviderConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(Into::into)
}

/// `HttpFetch` over reqwest
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self::with_client(create_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

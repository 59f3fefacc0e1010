//! Error types for the ilCorsaroNero provider

use thiserror::Error;

/// Errors raised while talking to ilCorsaroNero or reading its pages.
///
/// Search paths swallow these and degrade to empty results; only magnet
/// resolution hands them back to the caller.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network-level failure (DNS, timeout, connection reset, bad body)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Expected page structure was not there
    #[error("Failed to parse HTML: {0}")]
    Parse(String),

    /// Detail page has no magnet link
    #[error("Magnet link not found on {0}")]
    MagnetNotFound(String),

    /// Detail page says the torrent was deleted
    #[error("Torrent removed from site: {0}")]
    Removed(String),
}

impl ProviderError {
    /// Whether this is a transport failure (as opposed to a page-content one)
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let error = ProviderError::Status {
            url: "https://ilcorsaronero.link/search/?q=x".to_string(),
            status: 503,
        };
        assert_eq!(
            error.to_string(),
            "HTTP 503 for https://ilcorsaronero.link/search/?q=x"
        );
        assert!(error.is_transport());
    }

    #[test]
    fn test_resolution_errors_are_not_transport() {
        let error = ProviderError::MagnetNotFound("https://ilcorsaronero.link/torrent/1".to_string());
        assert_eq!(
            error.to_string(),
            "Magnet link not found on https://ilcorsaronero.link/torrent/1"
        );
        assert!(!error.is_transport());
        assert!(!ProviderError::Parse("no table".to_string()).is_transport());
    }
}

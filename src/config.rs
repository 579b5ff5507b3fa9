//! Configuration file parser for ~/.config/rss-gallery/config.toml.
//!
//! The config file is optional. A missing file yields `Config::default()`,
//! which points at the Vox feed with BBC, CNN and Reuters as fallbacks.
//! Unknown keys are accepted by serde but logged as likely typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::article::DEFAULT_MAX_ITEMS;
use crate::feed::FeedSource;
use crate::util::{origin_of, validate_url, UrlValidationError};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid URL for `{key}` ({url}): {source}")]
    InvalidUrl {
        key: &'static str,
        url: String,
        #[source]
        source: UrlValidationError,
    },
}

// ============================================================================
// Configuration Struct
// ============================================================================

pub const DEFAULT_PRIMARY_URL: &str = "https://www.vox.com/rss/index.xml";

pub const DEFAULT_FALLBACK_URLS: [&str; 3] = [
    "https://feeds.bbci.co.uk/news/rss.xml",
    "https://rss.cnn.com/rss/edition.rss",
    "https://feeds.reuters.com/reuters/topNews",
];

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed tried first on every load.
    pub primary_url: String,

    /// Feeds tried in order when the primary fails.
    pub fallback_urls: Vec<String>,

    /// Maximum number of articles shown from the loaded feed.
    pub max_items: usize,

    /// Overall per-request timeout, including the body download.
    pub request_timeout_seconds: u64,

    /// TCP/TLS connect timeout.
    pub connect_timeout_seconds: u64,

    /// Budget for the whole fallback chain. 0 = unbounded (sum of per-request timeouts).
    pub total_deadline_seconds: u64,

    /// Origin used to resolve root-relative image paths. Defaults to the primary feed's origin.
    pub site_url: Option<String>,

    pub user_agent: String,

    /// Skip TLS certificate verification. Only for feeds behind broken certificates.
    pub danger_accept_invalid_certs: bool,

    /// Column width of the description excerpt in the text listing.
    pub description_max_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_url: DEFAULT_PRIMARY_URL.to_string(),
            fallback_urls: DEFAULT_FALLBACK_URLS.iter().map(|s| s.to_string()).collect(),
            max_items: DEFAULT_MAX_ITEMS,
            request_timeout_seconds: 30,
            connect_timeout_seconds: 10,
            total_deadline_seconds: 60,
            site_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            danger_accept_invalid_certs: false,
            description_max_width: 120,
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 10] = [
        "primary_url",
        "fallback_urls",
        "max_items",
        "request_timeout_seconds",
        "connect_timeout_seconds",
        "total_deadline_seconds",
        "site_url",
        "user_agent",
        "danger_accept_invalid_certs",
        "description_max_width",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text. Blank text yields the defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            primary = %config.primary_url,
            fallbacks = config.fallback_urls.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Checks every configured URL, so a typo fails at startup instead of
    /// showing up as an unreachable source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.primary_url).map_err(invalid_url("primary_url", &self.primary_url))?;
        for url in &self.fallback_urls {
            validate_url(url).map_err(invalid_url("fallback_urls", url))?;
        }
        if let Some(site) = &self.site_url {
            validate_url(site).map_err(invalid_url("site_url", site))?;
        }

        if self.danger_accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for feed requests");
        }
        Ok(())
    }

    /// The primary source and its fallbacks in priority order.
    pub fn sources(&self) -> (FeedSource, Vec<FeedSource>) {
        (
            FeedSource::primary(self.primary_url.clone()),
            FeedSource::fallbacks(self.fallback_urls.iter().cloned()),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn total_deadline(&self) -> Option<Duration> {
        (self.total_deadline_seconds > 0).then(|| Duration::from_secs(self.total_deadline_seconds))
    }

    /// Base origin for root-relative image URLs: `site_url` if set, else the
    /// primary feed's origin.
    pub fn image_base(&self) -> Result<Url, ConfigError> {
        let (key, raw) = match &self.site_url {
            Some(site) => ("site_url", site.as_str()),
            None => ("primary_url", self.primary_url.as_str()),
        };
        let url = validate_url(raw).map_err(invalid_url(key, raw))?;
        Ok(origin_of(&url).unwrap_or(url))
    }
}

fn invalid_url<'a>(
    key: &'static str,
    url: &'a str,
) -> impl FnOnce(UrlValidationError) -> ConfigError + 'a {
    move |source| ConfigError::InvalidUrl {
        key,
        url: url.to_owned(),
        source,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.primary_url, DEFAULT_PRIMARY_URL);
        assert_eq!(config.fallback_urls.len(), 3);
        assert_eq!(config.max_items, DEFAULT_MAX_ITEMS);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.total_deadline(), Some(Duration::from_secs(60)));
        assert!(!config.danger_accept_invalid_certs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/rss_gallery_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.primary_url, DEFAULT_PRIMARY_URL);
    }

    #[test]
    fn test_whitespace_only_returns_default() {
        let config = Config::from_toml("   \n  \n  ").unwrap();
        assert_eq!(config.max_items, DEFAULT_MAX_ITEMS);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let config = Config::from_toml("max_items = 5\n").unwrap();
        assert_eq!(config.max_items, 5);
        assert_eq!(config.primary_url, DEFAULT_PRIMARY_URL);
        assert_eq!(config.request_timeout_seconds, 30);
    }

    #[test]
    fn test_full_config_from_file() {
        let dir = std::env::temp_dir().join("rss_gallery_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
primary_url = "https://example.com/rss"
fallback_urls = ["https://backup.example.com/rss", "https://other.example.org/atom.xml"]
max_items = 12
request_timeout_seconds = 5
connect_timeout_seconds = 2
total_deadline_seconds = 0
site_url = "https://www.example.com"
user_agent = "test-agent/1.0"
danger_accept_invalid_certs = true
description_max_width = 80
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.primary_url, "https://example.com/rss");
        assert_eq!(config.fallback_urls.len(), 2);
        assert_eq!(config.max_items, 12);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.total_deadline(), None);
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert!(config.danger_accept_invalid_certs);
        assert_eq!(config.description_max_width, 80);
        assert_eq!(config.image_base().unwrap().as_str(), "https://www.example.com/");

        let (primary, fallbacks) = config.sources();
        assert_eq!(primary.url, "https://example.com/rss");
        assert_eq!(fallbacks[1].url, "https://other.example.org/atom.xml");
        assert_eq!(fallbacks[1].priority, 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::from_toml("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::from_toml("max_items = \"lots\"\n").is_err());
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::from_toml("max_items = 3\ntheme = \"dark\"\n").unwrap();
        assert_eq!(config.max_items, 3);
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("rss_gallery_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_validate_rejects_bad_fallback() {
        let config = Config {
            fallback_urls: vec!["https://ok.example.com/rss".into(), "feeds/rss.xml".into()],
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        match err {
            ConfigError::InvalidUrl { key, url, .. } => {
                assert_eq!(key, "fallback_urls");
                assert_eq!(url, "feeds/rss.xml");
            }
            e => panic!("Expected InvalidUrl, got {:?}", e),
        }
    }

    #[test]
    fn test_image_base_defaults_to_primary_origin() {
        let config = Config::default();
        assert_eq!(config.image_base().unwrap().as_str(), "https://www.vox.com/");
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{AppError, ErrorKind, DEFAULT_API_BASE_URL, MAX_UPLOAD_BYTES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(String),
    #[error("API base URL {0:?} is not an absolute http(s) URL")]
    InvalidBaseUrl(String),
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Config, e.to_string())
    }
}

/// Tunables the shell may override with `Event::Configure`.
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub feed_initial_count: usize,
    pub feed_load_more_count: usize,
    pub sports_page_size: usize,
    pub new_events_count: usize,
    pub related_events_limit: usize,
    pub related_page_size: usize,
    pub hero_slide_count: usize,
    pub hero_interval_ms: u64,
    pub related_interval_ms: u64,
    pub new_events_interval_ms: u64,
    pub toast_duration_ms: u64,
    pub optimistic_comments: bool,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            feed_initial_count: 6,
            feed_load_more_count: 3,
            sports_page_size: 8,
            new_events_count: 5,
            related_events_limit: 12,
            related_page_size: 4,
            hero_slide_count: 3,
            hero_interval_ms: 5000,
            related_interval_ms: 5000,
            new_events_interval_ms: 8000,
            toast_duration_ms: 3000,
            optimistic_comments: false,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;

        let sizes = [
            ("feed_initial_count", self.feed_initial_count),
            ("feed_load_more_count", self.feed_load_more_count),
            ("sports_page_size", self.sports_page_size),
            ("related_page_size", self.related_page_size),
            ("max_upload_bytes", self.max_upload_bytes),
        ];
        if let Some((field, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Zero { field });
        }

        let intervals = [
            ("hero_interval_ms", self.hero_interval_ms),
            ("related_interval_ms", self.related_interval_ms),
            ("new_events_interval_ms", self.new_events_interval_ms),
            ("toast_duration_ms", self.toast_duration_ms),
        ];
        if let Some((field, _)) = intervals.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Zero { field });
        }

        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.api_base_url.trim_end_matches('/'))
            .map_err(|_| ConfigError::InvalidBaseUrl(self.api_base_url.clone()))?;
        if matches!(url.scheme(), "http" | "https") && url.has_host() {
            Ok(url)
        } else {
            Err(ConfigError::InvalidBaseUrl(self.api_base_url.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feed_initial_count, 6);
        assert_eq!(config.feed_load_more_count, 3);
        assert!(!config.optimistic_comments);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AppConfig::from_json(br#"{"feed_initial_count": 9}"#).unwrap();
        assert_eq!(config.feed_initial_count, 9);
        assert_eq!(config.feed_load_more_count, 3);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_rejects_zero_sizes() {
        let err = AppConfig::from_json(br#"{"related_page_size": 0}"#).unwrap_err();
        assert_eq!(err, ConfigError::Zero { field: "related_page_size" });
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = AppConfig {
            api_base_url: "ftp://example.com/api".into(),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            AppConfig::from_json(b"{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}

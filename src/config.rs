//! Application configuration.
//!
//! All settings live in a flat JSON file; every key has a working default so
//! the binary runs with no config file at all. The client id is the only
//! sensitive value and can be overridden from the environment via the CLI.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Hard cap on the listing `limit` query parameter accepted by the API.
pub const MAX_BATCH_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("query_batch_size must be between 1 and {max}, got {got}")]
    InvalidBatchSize { got: u32, max: u32 },

    #[error("resolution must be between (1, 1) and ({max}, {max}), got ({width}, {height})")]
    InvalidResolution { width: u32, height: u32, max: u32 },

    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reddit_access_token_url: String,
    pub reddit_api_endpoint: String,
    pub reddit_grant_type_header: String,
    pub reddit_device_id_header: String,
    pub reddit_content_type_header: String,
    pub reddit_app_client_id: String,
    pub platform: String,
    pub application_name: String,
    pub version: String,
    pub subreddit: String,
    pub subreddit_search_type: String,
    pub query_batch_size: u32,
    pub max_aggregated_query_time_secs: u64,
    pub existing_images_filename: String,
    pub request_timeout_secs: u64,
    pub max_resolution: u32,
    pub aspect_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reddit_access_token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            reddit_api_endpoint: "https://oauth.reddit.com".to_string(),
            reddit_grant_type_header: "https://oauth.reddit.com/grants/installed_client"
                .to_string(),
            reddit_device_id_header: "DO_NOT_TRACK_THIS_DEVICE".to_string(),
            reddit_content_type_header: "application/x-www-form-urlencoded".to_string(),
            reddit_app_client_id: "3gMaLS0rRxDTdEWErlrTEg".to_string(),
            platform: std::env::consts::OS.to_string(),
            application_name: "earthpullr".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            subreddit: "earthporn".to_string(),
            subreddit_search_type: "hot".to_string(),
            query_batch_size: MAX_BATCH_SIZE,
            max_aggregated_query_time_secs: 30,
            existing_images_filename: "earthpullr_existing_images.json".to_string(),
            request_timeout_secs: 10,
            max_resolution: 7680,
            aspect_tolerance: 0.25,
        }
    }
}

// The client id is a credential; keep it out of Debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("reddit_access_token_url", &self.reddit_access_token_url)
            .field("reddit_api_endpoint", &self.reddit_api_endpoint)
            .field("reddit_app_client_id", &"<redacted>")
            .field("subreddit", &self.subreddit)
            .field("subreddit_search_type", &self.subreddit_search_type)
            .field("query_batch_size", &self.query_batch_size)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration, optionally overridden by a JSON file.
    ///
    /// With no path the built-in defaults are returned. A file only needs to
    /// list the keys it overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            None => Ok(Self::default()),
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|source| ConfigError::Io {
                    path: p.display().to_string(),
                    source,
                })?;
                serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: p.display().to_string(),
                    source,
                })
            }
        }
    }

    /// One-time sanity check, run before any network call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_batch_size == 0 || self.query_batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize {
                got: self.query_batch_size,
                max: MAX_BATCH_SIZE,
            });
        }
        if self.reddit_app_client_id.is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "reddit_app_client_id",
                reason: "must not be empty".to_string(),
            });
        }
        if self.subreddit.is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "subreddit",
                reason: "must not be empty".to_string(),
            });
        }
        if !(self.aspect_tolerance > 0.0) {
            return Err(ConfigError::InvalidSetting {
                key: "aspect_tolerance",
                reason: format!("must be positive, got {}", self.aspect_tolerance),
            });
        }
        if self.max_resolution == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "max_resolution",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// `platform:application_name:version`, sent on every API request.
    pub fn user_agent(&self) -> String {
        format!(
            "{}:{}:{}",
            self.platform, self.application_name, self.version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.query_batch_size, 100);
        assert_eq!(config.aspect_tolerance, 0.25);
        assert_eq!(config.max_resolution, 7680);
    }

    #[test]
    fn test_load_without_file_returns_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.subreddit, "earthporn");
        assert_eq!(config.subreddit_search_type, "hot");
    }

    #[test]
    fn test_load_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"subreddit": "wallpapers", "query_batch_size": 25}}"#
        )
        .unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.subreddit, "wallpapers");
        assert_eq!(config.query_batch_size, 25);
        // Untouched keys keep their defaults
        assert_eq!(
            config.reddit_api_endpoint,
            "https://oauth.reddit.com"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/config.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validate_batch_size_bounds() {
        let mut config = Config::default();
        config.query_batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBatchSize { got: 0, .. })
        ));
        config.query_batch_size = 101;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBatchSize { got: 101, .. })
        ));
        config.query_batch_size = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_client_id() {
        let mut config = Config::default();
        config.reddit_app_client_id = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting {
                key: "reddit_app_client_id",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_nonpositive_tolerance() {
        let mut config = Config::default();
        config.aspect_tolerance = 0.0;
        assert!(config.validate().is_err());
        config.aspect_tolerance = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_user_agent_format() {
        let mut config = Config::default();
        config.platform = "linux".to_string();
        config.application_name = "earthpullr".to_string();
        config.version = "0.1.0".to_string();
        assert_eq!(config.user_agent(), "linux:earthpullr:0.1.0");
    }

    #[test]
    fn test_debug_redacts_client_id() {
        let config = Config::default();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&config.reddit_app_client_id));
    }
}

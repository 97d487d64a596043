// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream API access settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Local data and cache settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    ///
    /// A misconfigured client (zero concurrency, unparseable base URL) is
    /// fatal at startup, before any scraping begins.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(AppError::validation("api.base_url is not a valid URL"));
        }
        if self.api.concurrency == 0 {
            return Err(AppError::validation("api.concurrency must be > 0"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.api.page_size == 0 {
            return Err(AppError::validation("api.page_size must be > 0"));
        }
        if self.storage.data_path.trim().is_empty() {
            return Err(AppError::validation("storage.data_path is empty"));
        }
        if self.storage.cache_expiry_hours == 0 {
            return Err(AppError::validation("storage.cache_expiry_hours must be > 0"));
        }
        Ok(())
    }
}

/// Upstream API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the registry API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Maximum concurrently in-flight requests
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Page size for paginated bulk endpoints
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-endpoint-family credentials
    #[serde(default)]
    pub credentials: Credentials,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            concurrency: defaults::concurrency(),
            timeout_secs: defaults::timeout(),
            page_size: defaults::page_size(),
            user_agent: defaults::user_agent(),
            credentials: Credentials::default(),
        }
    }
}

/// API keys for all three endpoint families. Each family is
/// authenticated independently upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Keys for `classtt/*` endpoints
    #[serde(default)]
    pub timetable: ApiKeys,

    /// Keys for `module` and `examtt` endpoints
    #[serde(default)]
    pub course: ApiKeys,

    /// Keys for `config/get-acadgroup` and `config/get-acadorg`
    #[serde(default)]
    pub academic_org: ApiKeys,
}

/// One endpoint family's header key pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub app_key: String,

    #[serde(default)]
    pub student_key: String,
}

/// Local data and cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for scraped output and the cache
    #[serde(default = "defaults::data_path")]
    pub data_path: String,

    /// Default cache freshness window in hours
    #[serde(default = "defaults::cache_expiry_hours")]
    pub cache_expiry_hours: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: defaults::data_path(),
            cache_expiry_hours: defaults::cache_expiry_hours(),
        }
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://api.example.edu/registry/".to_string()
    }

    pub fn concurrency() -> usize {
        5
    }

    pub fn timeout() -> u64 {
        60
    }

    pub fn page_size() -> usize {
        1000
    }

    pub fn user_agent() -> String {
        format!("modscraper/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn data_path() -> String {
        "data".to_string()
    }

    pub fn cache_expiry_hours() -> u64 {
        24
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = AppConfig::default();
        config.api.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://registry.test/"
            concurrency = 2

            [api.credentials.timetable]
            app_key = "tt-app"
            student_key = "tt-student"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://registry.test/");
        assert_eq!(config.api.concurrency, 2);
        assert_eq!(config.api.page_size, 1000);
        assert_eq!(config.api.credentials.timetable.app_key, "tt-app");
        assert!(config.api.credentials.course.app_key.is_empty());
        assert_eq!(config.storage.cache_expiry_hours, 24);
    }
}

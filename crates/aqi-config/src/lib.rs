use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_HTTP_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_ENDPOINT: &str = "https://api.data.gov.in/resource";
/// Real time air quality index dataset
pub const DEFAULT_RESOURCE_ID: &str = "3b01bcb8-0b14-4abf-b6f2-c1bfd384ba69";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RECORD_LIMIT: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    pub bind: Option<String>,
    /// Allowed CORS origins; "*" allows any
    pub cors_allow: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamSection {
    pub endpoint: Option<String>,
    pub resource_id: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub server: Option<ServerConfig>,
    pub upstream: Option<UpstreamSection>,
}

/// Resolved settings handed to the upstream client at startup
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamConfig {
    /// Full dataset URL, endpoint joined with resource id
    pub dataset_url: Url,
    pub api_key: String,
    pub timeout: Duration,
    pub limit: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid upstream endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("Upstream API key not configured (set AQI_API_KEY or [upstream].api_key)")]
    MissingApiKey,
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl AppConfig {
    /// Load configuration from AQI_CONFIG path (TOML) if present, then apply
    /// AQI_API_KEY / AQI_HTTP_BIND overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("AQI_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = Self::from_path(&path)?;
        cfg.apply_env_overrides(
            std::env::var("AQI_API_KEY").ok(),
            std::env::var("AQI_HTTP_BIND").ok(),
        );
        Ok(cfg)
    }

    /// Read a TOML file; a missing file yields defaults
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let s = fs::read_to_string(path)?;
        Ok(toml::from_str::<AppConfig>(&s)?)
    }

    pub fn apply_env_overrides(&mut self, api_key: Option<String>, http_bind: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.upstream.get_or_insert_with(Default::default).api_key = Some(key);
        }
        if let Some(bind) = http_bind.filter(|b| !b.trim().is_empty()) {
            self.server.get_or_insert_with(Default::default).bind = Some(bind);
        }
    }

    /// Get HTTP bind address (default 0.0.0.0:8080)
    pub fn http_bind(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_HTTP_BIND.to_string())
    }

    /// Get allowed CORS origins (default any)
    pub fn cors_allow(&self) -> Vec<String> {
        self.server
            .as_ref()
            .and_then(|s| s.cors_allow.clone())
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()])
    }

    /// Resolve and validate the upstream settings
    pub fn upstream(&self) -> Result<UpstreamConfig, ConfigError> {
        let section = self.upstream.clone().unwrap_or_default();

        let api_key = section
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let endpoint = section
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let resource_id = section
            .resource_id
            .unwrap_or_else(|| DEFAULT_RESOURCE_ID.to_string());
        // Url::join drops the last segment unless the base ends with '/'
        let base = Url::parse(&format!("{}/", endpoint.trim_end_matches('/')))?;
        let dataset_url = base.join(resource_id.trim_matches('/'))?;

        let timeout_secs = section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "upstream.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        let limit = section.limit.unwrap_or(DEFAULT_RECORD_LIMIT);
        if limit == 0 {
            return Err(ConfigError::Invalid {
                field: "upstream.limit",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(UpstreamConfig {
            dataset_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            limit,
        })
    }
}

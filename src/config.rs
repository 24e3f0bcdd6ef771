//! Client configuration
//!
//! Configuration is read from YAML. The access token may be left out of the
//! file and supplied through the `SFO_ACCESS_TOKEN` environment variable.

use crate::error::{Error, Result, ResultExt};
use crate::sobject::ObjectMap;
use crate::types::{BackoffType, OptionStringExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable consulted when no access token is configured
pub const ACCESS_TOKEN_ENV: &str = "SFO_ACCESS_TOKEN";

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Instance base URL (e.g., "https://example.my.salesforce.com")
    pub instance_url: String,

    /// REST API version without the leading "v"
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Bearer token for requests
    #[serde(default)]
    pub access_token: Option<String>,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Remote type name → class name
    #[serde(default)]
    pub object_map: HashMap<String, String>,
}

fn default_api_version() -> String {
    "59.0".to_string()
}

impl ClientConfig {
    /// Create a config for an instance with defaults everywhere else
    pub fn new(instance_url: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into(),
            api_version: default_api_version(),
            access_token: None,
            http: HttpConfig::default(),
            object_map: HashMap::new(),
        }
    }

    /// Parse a config from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value formats
    pub fn validate(&self) -> Result<()> {
        if self.instance_url.trim().is_empty() {
            return Err(Error::missing_config_field("instance_url"));
        }
        url::Url::parse(&self.instance_url).map_err(|e| Error::InvalidConfigValue {
            field: "instance_url".to_string(),
            message: e.to_string(),
        })?;

        let valid_version = self
            .api_version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
        if !valid_version {
            return Err(Error::InvalidConfigValue {
                field: "api_version".to_string(),
                message: format!("expected a version like 59.0, got '{}'", self.api_version),
            });
        }

        if self.http.retry_backoff.initial_ms > self.http.retry_backoff.max_ms {
            return Err(Error::InvalidConfigValue {
                field: "http.retry_backoff".to_string(),
                message: "initial_ms must not exceed max_ms".to_string(),
            });
        }
        Ok(())
    }

    /// Access token from the config, or from the environment
    pub fn resolve_access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .none_if_empty()
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok().none_if_empty())
    }

    /// Apply the configured type mappings on top of a class registry
    pub fn apply_object_map(&self, mut map: ObjectMap) -> ObjectMap {
        for (type_name, class_name) in &self.object_map {
            map = map.map_type(type_name, class_name);
        }
        map
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: BackoffConfig::default(),
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

// ============================================================================
// Loading
// ============================================================================

/// Load a config file
pub fn load_config(path: impl AsRef<Path>) -> Result<ClientConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    ClientConfig::from_yaml(&contents)
}

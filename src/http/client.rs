//! HTTP client with retry
//!
//! A blocking client for the REST data API. It handles:
//! - Bearer authentication
//! - Automatic retries with configurable backoff
//! - URL building for query, sObject and `nextRecordsUrl` endpoints
//!
//! Responses are handed back untouched; status classification belongs to
//! [`QueryResult::from_response`].

use super::continuation::Continuation;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::pagination::MoreResults;
use crate::result::QueryResult;
use crate::sobject::ObjectMap;
use crate::types::{BackoffType, JsonValue};
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Instance base URL
    pub instance_url: String,
    /// REST API version without the leading "v"
    pub api_version: String,
    /// Bearer token
    pub access_token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            instance_url: String::new(),
            api_version: "59.0".to_string(),
            access_token: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            user_agent: format!("sfo-records/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

impl From<&ClientConfig> for HttpClientConfig {
    fn from(config: &ClientConfig) -> Self {
        let mut http = Self {
            instance_url: config.instance_url.clone(),
            api_version: config.api_version.clone(),
            access_token: config.resolve_access_token(),
            timeout: Duration::from_secs(config.http.timeout_seconds),
            max_retries: config.http.max_retries,
            initial_backoff: Duration::from_millis(config.http.retry_backoff.initial_ms),
            max_backoff: Duration::from_millis(config.http.retry_backoff.max_ms),
            backoff_type: config.http.retry_backoff.backoff_type,
            ..Self::default()
        };
        if let Some(agent) = &config.http.user_agent {
            http.user_agent.clone_from(agent);
        }
        http
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the instance URL
    pub fn instance_url(mut self, url: impl Into<String>) -> Self {
        self.config.instance_url = url.into();
        self
    }

    /// Set the API version
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Set the bearer token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Blocking HTTP client for the REST data API
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        if config.instance_url.is_empty() {
            return Err(Error::missing_config_field("instance_url"));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, config })
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    // ========================================================================
    // Data API
    // ========================================================================

    /// Run a SOQL query
    pub fn query(&self, soql: &str, object_map: Arc<ObjectMap>) -> Result<QueryResult> {
        self.run_query("query", soql, object_map)
    }

    /// Run a SOQL query including deleted and archived records
    pub fn query_all(&self, soql: &str, object_map: Arc<ObjectMap>) -> Result<QueryResult> {
        self.run_query("queryAll", soql, object_map)
    }

    /// Fetch the page behind a `nextRecordsUrl`
    pub fn query_more(
        &self,
        next_records_url: &str,
        object_map: Arc<ObjectMap>,
    ) -> Result<QueryResult> {
        let response = self.send(Method::GET, next_records_url, &[], None)?;
        self.query_result(response, object_map)
    }

    /// Retrieve a single record by id
    pub fn retrieve(
        &self,
        sobject: &str,
        id: &str,
        object_map: Arc<ObjectMap>,
    ) -> Result<QueryResult> {
        let url = self.data_url(&format!("sobjects/{sobject}/{id}"))?;
        let response = self.send(Method::GET, url.as_str(), &[], None)?;
        self.query_result(response, object_map)
    }

    /// Create a record; the new id is available through `last_id()`
    pub fn create(
        &self,
        sobject: &str,
        fields: &JsonValue,
        object_map: Arc<ObjectMap>,
    ) -> Result<QueryResult> {
        let url = self.data_url(&format!("sobjects/{sobject}"))?;
        let response = self.send(Method::POST, url.as_str(), &[], Some(fields))?;
        self.query_result(response, object_map)
    }

    /// Continuation that follows `nextRecordsUrl` cursors with this client
    pub fn continuation(&self, object_map: Arc<ObjectMap>) -> Arc<dyn MoreResults> {
        Arc::new(Continuation::new(self.clone(), object_map))
    }

    fn run_query(
        &self,
        endpoint: &str,
        soql: &str,
        object_map: Arc<ObjectMap>,
    ) -> Result<QueryResult> {
        let url = self.data_url(endpoint)?;
        debug!(endpoint, soql, "Running query");
        let response = self.send(Method::GET, url.as_str(), &[("q", soql)], None)?;
        self.query_result(response, object_map)
    }

    fn query_result(&self, response: Response, object_map: Arc<ObjectMap>) -> Result<QueryResult> {
        let continuation = self.continuation(Arc::clone(&object_map));
        QueryResult::from_response(response, object_map, Some(continuation))
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// URL under `/services/data/v{version}/`
    pub fn data_url(&self, path: &str) -> Result<Url> {
        let base = format!(
            "{}/services/data/v{}/",
            self.config.instance_url.trim_end_matches('/'),
            self.config.api_version
        );
        Ok(Url::parse(&base)?.join(path.trim_start_matches('/'))?)
    }

    /// Send a request, retrying throttled and failed attempts
    ///
    /// The last response is returned whatever its status.
    pub fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&JsonValue>,
    ) -> Result<Response> {
        let full_url = self.build_url(url);
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            let mut req = self
                .client
                .request(method.clone(), &full_url)
                .header(ACCEPT, "application/json");
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(token) = &self.config.access_token {
                req = req.bearer_auth(token);
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            match req.send() {
                Ok(response) => {
                    let status = response.status();
                    if is_retryable_status(status) && attempt < max_retries {
                        let delay = if status == StatusCode::TOO_MANY_REQUESTS {
                            extract_retry_after(&response)
                                .map_or_else(|| self.calculate_backoff(attempt), |d| {
                                    d.min(self.config.max_backoff)
                                })
                        } else {
                            self.calculate_backoff(attempt)
                        };
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {:?}",
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        std::thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }

                    debug!("Request completed: {} {} ({})", method, full_url, status.as_u16());
                    return Ok(response);
                }
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < max_retries => {
                    let delay = self.calculate_backoff(attempt);
                    warn!(
                        "Request error ({e}), attempt {}/{}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(Error::Http(e)),
            }
        }
    }

    /// Build full URL from an absolute URL or an instance-relative path
    pub(crate) fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        let base = self.config.instance_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = self.config.initial_backoff;
        let delay = match self.config.backoff_type {
            BackoffType::Constant => Some(initial),
            BackoffType::Linear => initial.checked_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => initial.checked_mul(2u32.saturating_pow(attempt)),
        };

        delay.map_or(self.config.max_backoff, |d| d.min(self.config.max_backoff))
    }
}

/// Check if an HTTP status is retryable
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

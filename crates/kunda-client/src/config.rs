//! Backend connection configuration.
//!
//! Built explicitly, from the CLI configuration file, or from the
//! environment (`KUNDA_BACKEND_URL`, `KUNDA_API_KEY`, `KUNDA_TIMEOUT_SECS`).

use url::Url;

/// Environment variable holding the backend base URL.
pub const ENV_BACKEND_URL: &str = "KUNDA_BACKEND_URL";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "KUNDA_API_KEY";
/// Environment variable holding the request timeout.
pub const ENV_TIMEOUT_SECS: &str = "KUNDA_TIMEOUT_SECS";
/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the backend.
///
/// Custom `Debug` implementation redacts the `api_key` field.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project base URL; API paths (`rest/v1/...`) are joined onto it.
    pub url: Url,
    /// Anonymous API key, sent as `apikey` and as a bearer token.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl BackendConfig {
    /// Validate and build a configuration.
    pub fn new(url: &str, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self {
            url: parse_base_url(url)?,
            api_key,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Override the request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs.max(1);
        self
    }

    /// Load from the environment. URL and key are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var(ENV_BACKEND_URL)
            .map_err(|_| ConfigError::MissingVar(ENV_BACKEND_URL))?;
        let api_key =
            std::env::var(ENV_API_KEY).map_err(|_| ConfigError::MissingVar(ENV_API_KEY))?;
        let timeout_secs = std::env::var(ENV_TIMEOUT_SECS)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(Self::new(&url, api_key)?.with_timeout_secs(timeout_secs))
    }
}

/// Parse a base URL, keeping a trailing slash so relative joins append.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(raw.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(
            raw.to_string(),
            format!("unsupported scheme {:?}", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
    /// The backend URL does not parse.
    #[error("invalid backend URL {0:?}: {1}")]
    InvalidUrl(String, String),
    /// The API key is blank.
    #[error("API key must not be empty")]
    EmptyApiKey,
    /// The API key cannot be sent as an HTTP header value.
    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,
}

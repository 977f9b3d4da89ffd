//! # CLI Configuration
//!
//! Optional YAML file passed with `--config`:
//!
//! ```yaml
//! backend:
//!   url: https://project.example.co
//!   api_key: anon-key
//!   timeout_secs: 5
//! limits:
//!   max_amount_per_transfer_eur: 500
//!   weekly_limit_eur: 300
//! rates:
//!   - { from: EUR, to: XAF, rate: 655.96 }
//! fees:
//!   - corridor: FRANCE_TO_GABON
//!     payment_method: CARD
//!     receiving_method: AIRTEL_MONEY
//!     fee_percentage: 0.006
//! ```
//!
//! `rates` and `fees` override rows of the built-in tables.
//! `KUNDA_BACKEND_URL`, `KUNDA_API_KEY` and `KUNDA_TIMEOUT_SECS` override
//! the `backend` section.

use std::path::Path;

use anyhow::{bail, Context, Result};
use kunda_client::config::{ENV_API_KEY, ENV_BACKEND_URL, ENV_TIMEOUT_SECS};
use kunda_client::BackendConfig;
use kunda_pricing::tables::{FeeEntry, RateEntry};
use kunda_pricing::TransferLimits;
use serde::Deserialize;

/// Backend connection section.
///
/// Custom `Debug` implementation redacts the `api_key` field.
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for BackendSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSection")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Everything the CLI reads from its configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub backend: BackendSection,
    pub limits: TransferLimits,
    pub rates: Vec<RateEntry>,
    pub fees: Vec<FeeEntry>,
}

impl CliConfig {
    /// Load the file at `path` (if any), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// Like [`CliConfig::load`], with overrides looked up through `var`.
    pub fn load_with_env(
        path: Option<&Path>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                Self::from_yaml(&content)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(var);
        Ok(config)
    }

    /// Parse a YAML document. An empty document is the default config.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply backend overrides looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_BACKEND_URL) {
            self.backend.url = Some(url);
        }
        if let Some(key) = var(ENV_API_KEY) {
            self.backend.api_key = Some(key);
        }
        if let Some(secs) = var(ENV_TIMEOUT_SECS).and_then(|s| s.parse().ok()) {
            self.backend.timeout_secs = Some(secs);
        }
    }

    /// Backend settings, or `None` to price from the static tables alone.
    pub fn backend_config(&self) -> Result<Option<BackendConfig>> {
        let Some(url) = self.backend.url.as_deref() else {
            return Ok(None);
        };
        let Some(api_key) = self.backend.api_key.as_deref() else {
            bail!("backend URL is set but no API key ({ENV_API_KEY} or backend.api_key)");
        };
        let mut config = BackendConfig::new(url, api_key)?;
        if let Some(secs) = self.backend.timeout_secs {
            config = config.with_timeout_secs(secs);
        }
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kunda_core::{Corridor, Currency, Rail};
    use std::collections::HashMap;
    use std::io::Write;

    const SAMPLE: &str = r#"
backend:
  url: https://project.example.co
  api_key: file-key
  timeout_secs: 5
limits:
  weekly_limit_eur: 450
rates:
  - { from: EUR, to: XAF, rate: 650.0 }
fees:
  - corridor: FRANCE_TO_GABON
    payment_method: CARD
    receiving_method: AIRTEL_MONEY
    fee_percentage: 0.01
"#;

    #[test]
    fn loads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = CliConfig::load_with_env(Some(file.path()), |_| None).unwrap();
        assert_eq!(config.backend.url.as_deref(), Some("https://project.example.co"));
        assert_eq!(config.limits.weekly_limit_eur, 450.0);
        assert_eq!(config.limits.max_amount_per_transfer_eur, 500.0);
        assert_eq!(config.rates[0].from, Currency::Eur);
        assert_eq!(config.rates[0].rate, 650.0);
        assert_eq!(
            config.fees[0].corridor,
            "FRANCE_TO_GABON".parse::<Corridor>().unwrap()
        );
        assert_eq!(config.fees[0].receiving_method, Rail::AirtelMoney);

        let backend = config.backend_config().unwrap().unwrap();
        assert_eq!(backend.api_key, "file-key");
        assert_eq!(backend.timeout_secs, 5);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            CliConfig::load_with_env(Some(&dir.path().join("absent.yaml")), |_| None).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config file"));
    }

    #[test]
    fn empty_file_is_default() {
        let config = CliConfig::from_yaml("   \n").unwrap();
        assert!(config.backend.url.is_none());
        assert!(config.rates.is_empty());
        assert_eq!(config.limits, TransferLimits::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(CliConfig::from_yaml("backend:\n  uri: x\n").is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = CliConfig::from_yaml(SAMPLE).unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "env-key"),
            (ENV_TIMEOUT_SECS, "not-a-number"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.backend.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.backend.url.as_deref(), Some("https://project.example.co"));
        assert_eq!(config.backend.timeout_secs, Some(5));
    }

    #[test]
    fn no_backend_without_url() {
        let config = CliConfig::default();
        assert!(config.backend_config().unwrap().is_none());
    }

    #[test]
    fn url_without_key_is_an_error() {
        let mut config = CliConfig::default();
        config.apply_env(|name| (name == ENV_BACKEND_URL).then(|| "https://x.example".to_string()));
        assert!(config.backend_config().is_err());
    }
}

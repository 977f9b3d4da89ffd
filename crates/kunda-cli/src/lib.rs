//! # kunda-cli — KundaPay Pricing CLI
//!
//! Provides the `kunda` command-line interface over the pricing stack.
//!
//! ## Subcommands
//!
//! - `kunda quote` — Price a transfer from either side.
//! - `kunda withdrawal-fee` — Mobile-money cash-out fee breakdown.
//! - `kunda rates` / `kunda fees` — Inspect exchange rates and fee rules.
//! - `kunda promo` — Validate a promo code against the backend.
//! - `kunda reference` — Generate a unique transfer reference.
//! - `kunda limits` — Per-transfer and weekly limits.
//!
//! ```bash
//! kunda quote --corridor FRANCE_TO_GABON --pay CARD --payout AIRTEL_MONEY --send 100
//! kunda withdrawal-fee --rail MOOV_MONEY 250000
//! kunda --config kunda.yaml limits show
//! ```
//!
//! Without a configured backend every command prices from the built-in
//! tables; commands that only exist on the backend fail with a message.

pub mod config;
pub mod limits;
pub mod promo;
pub mod quote;
pub mod reference;
pub mod tables;
pub mod withdrawal;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use kunda_client::HttpBackend;
use kunda_pricing::source::{FallbackSource, FeeSource, RateSource};
use kunda_pricing::{StaticTables, TransferCalculator};
use serde::Serialize;

use crate::config::CliConfig;

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Sources and settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: CliConfig,
    pub format: OutputFormat,
    pub tables: Arc<StaticTables>,
    pub backend: Option<Arc<HttpBackend>>,
}

impl Context {
    /// Build the static tables (with file overrides) and, when configured,
    /// the backend client.
    pub fn new(config: CliConfig, format: OutputFormat) -> Result<Self> {
        let tables = Arc::new(StaticTables::defaults().with_overrides(&config.rates, &config.fees));
        let backend = match config.backend_config()? {
            Some(backend_config) => {
                tracing::debug!(?backend_config, "using backend");
                Some(Arc::new(
                    HttpBackend::new(&backend_config).context("failed to build backend client")?,
                ))
            }
            None => None,
        };
        Ok(Self {
            config,
            format,
            tables,
            backend,
        })
    }

    /// The backend, or an error naming the operation that needs it.
    pub fn require_backend(&self, operation: &str) -> Result<Arc<HttpBackend>> {
        self.backend.clone().with_context(|| {
            format!("{operation} needs a backend (set KUNDA_BACKEND_URL and KUNDA_API_KEY or use --config)")
        })
    }

    /// Rates from the backend with the tables as fallback, or the tables alone.
    pub fn rates(&self) -> Arc<dyn RateSource> {
        match &self.backend {
            Some(b) => Arc::new(FallbackSource::new(b.clone(), self.tables.clone())),
            None => self.tables.clone(),
        }
    }

    /// Fee rules from the backend with the tables as fallback, or the tables alone.
    pub fn fees(&self) -> Arc<dyn FeeSource> {
        match &self.backend {
            Some(b) => Arc::new(FallbackSource::new(b.clone(), self.tables.clone())),
            None => self.tables.clone(),
        }
    }

    /// A calculator wired to every available source.
    pub fn calculator(&self) -> TransferCalculator {
        let calc = TransferCalculator::new(self.rates(), self.fees());
        match &self.backend {
            Some(b) => calc
                .with_promo_validator(b.clone())
                .with_loyalty_service(b.clone()),
            None => calc,
        }
    }

    /// Print `value` as JSON, or `text` in text mode.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => println!("{}", text()),
        }
        Ok(())
    }
}

/// Run `work` on a blocking thread of a fresh Tokio runtime.
///
/// Backend calls drive their requests with `Handle::block_on`, which needs
/// a runtime context but must not run on an executor thread.
pub fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    rt.block_on(async { tokio::task::spawn_blocking(work).await })
        .context("command task failed")
}

//! # kunda-client — KundaPay Backend Client
//!
//! Typed HTTP access to the KundaPay backend, a PostgREST API exposing the
//! configuration tables (`exchange_rates`, `transfer_fees`,
//! `transfer_limits`, `transfers`) and stored procedures
//! (`validate_promo_code`, `calculate_loyalty_discount`,
//! `check_weekly_transfer_limit`).
//!
//! ## Architecture
//!
//! [`HttpBackend`] implements every collaborator trait of `kunda-pricing`:
//! `RateSource`, `FeeSource`, `PromoValidator`, `LoyaltyService`,
//! `WeeklyLimitChecker` and `ReferenceRegistry`. The traits are
//! synchronous; each call drives its request to completion on the current
//! Tokio runtime with `Handle::block_on`, so callers must run them off the
//! async executor (e.g. inside `spawn_blocking`).
//!
//! ## Crate Policy
//!
//! - No pricing arithmetic. Rates and fees are fetched, never computed.
//! - No retries. A failed rate or fee lookup is answered by the static
//!   tables through `FallbackSource`; promo and loyalty failures surface.

pub mod backend;
pub mod config;
pub mod error;

pub use backend::HttpBackend;
pub use config::{BackendConfig, ConfigError};
pub use error::BackendError;

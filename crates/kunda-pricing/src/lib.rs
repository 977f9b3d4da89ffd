//! # kunda-pricing — Transfer Pricing
//!
//! Turns "I want to send X" (or "they should receive Y") into a fully
//! priced transfer quote.
//!
//! - **Sources** (`source.rs`, `tables.rs`): the configuration-provider
//!   abstraction for exchange rates and fee rules. A remote implementation
//!   lives in `kunda-client`; `StaticTables` carries the built-in defaults;
//!   `FallbackSource` chains the two by availability.
//!
//! - **Promo** (`promo.rs`): promo-code records, validation, and the
//!   adjustment of the fee percentage.
//!
//! - **Loyalty** (`loyalty.rs`): points-to-discount conversion and the
//!   eligibility rule for outbound transfers from Gabon.
//!
//! - **Withdrawal** (`withdrawal.rs`): the tiered mobile-money cash-out fee
//!   schedule.
//!
//! - **Calculator** (`calculator.rs`): the bidirectional send/receive
//!   computation tying everything together.
//!
//! - **Limits** (`limits.rs`) and **Reference** (`reference.rs`): checks and
//!   helpers that run around a quote before a transfer is submitted.
//!
//! ## Crate Policy
//!
//! - Depends on `kunda-core` only. No I/O, no async.
//! - All collaborators are `Send + Sync` trait objects so they can be shared
//!   behind an `Arc`.

pub mod calculator;
pub mod error;
pub mod limits;
pub mod loyalty;
pub mod promo;
pub mod reference;
pub mod source;
pub mod tables;
pub mod withdrawal;

pub use calculator::{AmountSide, QuoteRequest, TransferCalculator, TransferQuote};
pub use error::{PricingError, SourceError};
pub use limits::{LimitCheck, TransferLimits, WeeklyLimitChecker, WeeklyLimitPolicy};
pub use loyalty::{LoyaltyDiscount, LoyaltyService};
pub use promo::{DiscountType, PromoCode, PromoGrant, PromoValidator};
pub use source::{ConfigSource, FallbackSource, FeeKey, FeeSource, RateSource};
pub use tables::StaticTables;
pub use withdrawal::{WithdrawalFee, WithdrawalSchedule};

//! # Pricing Errors
//!
//! `SourceError` is the recoverable failure of a configuration lookup.
//! `PricingError` is everything a quote can fail with; each variant renders
//! a distinct message the UI can show as-is.

use kunda_core::{Corridor, Currency, RailPair, ValidationError};
use thiserror::Error;

use crate::loyalty::LoyaltyError;
use crate::promo::PromoError;

/// A configuration source could not answer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The backing service is unreachable or returned an error.
    #[error("{backend} unavailable: {reason}")]
    Unavailable {
        /// Name of the source that failed.
        backend: String,
        /// Human-readable cause.
        reason: String,
    },

    /// The backing service answered with something unusable.
    #[error("{backend} returned an invalid value: {reason}")]
    InvalidValue {
        /// Name of the source that failed.
        backend: String,
        /// What was wrong with the value.
        reason: String,
    },
}

/// Failure to price a transfer.
#[derive(Error, Debug)]
pub enum PricingError {
    /// Principal is zero, negative or not a number.
    #[error("amount must be greater than 0 (got {0})")]
    InvalidAmount(f64),

    /// A domain primitive failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The payment rail cannot be used to pay (e.g. a receive-only card
    /// push network).
    #[error("{rails} is not allowed on {corridor}")]
    RailNotAllowed {
        /// The requested corridor.
        corridor: Corridor,
        /// The requested rails.
        rails: RailPair,
    },

    /// No exchange rate is known for the currency pair.
    #[error("exchange rate unavailable ({from} -> {to})")]
    RateUnavailable {
        /// Sender currency.
        from: Currency,
        /// Recipient currency.
        to: Currency,
    },

    /// No fee rule is known for the corridor and rail combination.
    #[error("fees unavailable for {corridor} via {rails}")]
    FeeUnavailable {
        /// The requested corridor.
        corridor: Corridor,
        /// The requested rails.
        rails: RailPair,
    },

    /// A fee rule exists but cannot be used (negative or >= 100 %).
    #[error("invalid fee percentage {fee_percentage} for {corridor}")]
    InvalidFeeConfiguration {
        /// The requested corridor.
        corridor: Corridor,
        /// The offending fraction.
        fee_percentage: f64,
    },

    /// Promo code rejected or could not be checked.
    #[error(transparent)]
    Promo(#[from] PromoError),

    /// Loyalty discount could not be computed.
    #[error(transparent)]
    Loyalty(#[from] LoyaltyError),
}

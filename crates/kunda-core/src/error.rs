//! # Error Types — Domain Validation
//!
//! Errors raised when parsing or constructing domain primitives. All
//! variants carry the offending input so the message can be shown to the
//! user unchanged.

use thiserror::Error;

/// Validation failure for a domain primitive.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Country code is not one of the served countries.
    #[error("unknown country: {0:?}")]
    UnknownCountry(String),

    /// Currency code is not supported.
    #[error("unknown currency: {0:?}")]
    UnknownCurrency(String),

    /// Rail name is not a known payment or cash-out method.
    #[error("unknown payment method: {0:?}")]
    UnknownRail(String),

    /// The country pair is not a served transfer route.
    #[error("invalid transfer corridor: {0}")]
    InvalidCorridor(String),

    /// A rail was used on the wrong side of a transfer.
    #[error("{rail} cannot be used as a {side} method")]
    RailSideMismatch {
        /// Wire name of the rail.
        rail: String,
        /// "payment" or "receiving".
        side: &'static str,
    },

    /// Amounts must be finite and strictly positive.
    #[error("amount must be greater than 0, got {0}")]
    InvalidAmount(f64),

    /// Identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

//! # Promo Codes
//!
//! A promo code lowers the platform fee of a transfer on one corridor for a
//! bounded period. It is either a percentage off the fee percentage or a
//! fixed amount (origin currency) off the fee.
//!
//! ## Validation Order
//!
//! Rejections are checked in a fixed order so the user always sees the
//! first reason that applies:
//!
//! 1. unknown code
//! 2. inactive
//! 3. not yet valid
//! 4. expired
//! 5. usage cap reached
//! 6. wrong corridor
//! 7. reserved for another user
//! 8. already redeemed by this user
//!
//! [`InMemoryPromoBook`] implements the order locally; the backend
//! validator in `kunda-client` delegates it to a stored procedure.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use kunda_core::{Corridor, PromoCodeId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SourceError;

/// How a promo code discounts the fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiscountType {
    /// Percentage off the fee percentage.
    Percentage,
    /// Fixed amount off the fee, in the sender's currency.
    Fixed,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percentage => f.write_str("PERCENTAGE"),
            Self::Fixed => f.write_str("FIXED"),
        }
    }
}

/// Promo-code rejection or lookup failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PromoError {
    /// No code with this text exists.
    #[error("promo code {0:?} does not exist")]
    Unknown(String),

    /// The code has been switched off.
    #[error("promo code {0:?} is not active")]
    Inactive(String),

    /// Validity window has not started.
    #[error("promo code {code:?} is not valid before {starts_at}")]
    NotYetValid {
        /// Code text.
        code: String,
        /// Start of the validity window.
        starts_at: DateTime<Utc>,
    },

    /// Validity window has ended.
    #[error("promo code {code:?} expired on {ended_at}")]
    Expired {
        /// Code text.
        code: String,
        /// End of the validity window.
        ended_at: DateTime<Utc>,
    },

    /// Global usage cap reached.
    #[error("promo code {code:?} has reached its usage limit of {max_uses}")]
    Exhausted {
        /// Code text.
        code: String,
        /// Cap on redemptions.
        max_uses: u32,
    },

    /// The code is scoped to another corridor.
    #[error("promo code {code:?} is only valid for {valid_for}, not {requested}")]
    WrongCorridor {
        /// Code text.
        code: String,
        /// Corridor the code was issued for.
        valid_for: Corridor,
        /// Corridor of the transfer.
        requested: Corridor,
    },

    /// The code is issued to a single user who is not the caller.
    #[error("promo code {0:?} is reserved for another user")]
    ReservedForAnotherUser(String),

    /// The caller already redeemed the code.
    #[error("promo code {0:?} has already been used")]
    AlreadyUsed(String),

    /// The remote validator rejected the code with its own message.
    #[error("promo code rejected: {0}")]
    Rejected(String),

    /// A new code definition failed admin validation.
    #[error("invalid promo code definition: {0}")]
    InvalidDefinition(String),

    /// The validator could not be reached.
    #[error("promo validation unavailable: {0}")]
    Backend(#[from] SourceError),
}

/// A promo-code record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoCode {
    /// Identifier.
    pub id: PromoCodeId,
    /// Code text as typed by users.
    pub code: String,
    /// Corridor the code applies to.
    pub direction: Corridor,
    /// Percentage or fixed.
    pub discount_type: DiscountType,
    /// Percent (0–100] or amount in the sender's currency.
    pub discount_value: f64,
    /// Start of validity.
    pub start_date: DateTime<Utc>,
    /// End of validity.
    pub end_date: DateTime<Utc>,
    /// Cap on redemptions across all users; `None` is unlimited.
    #[serde(default)]
    pub max_uses: Option<u32>,
    /// Redemptions so far.
    #[serde(default)]
    pub current_uses: u32,
    /// Switched on.
    pub active: bool,
    /// Restricts the code to a single user.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl PromoCode {
    /// Admin-side checks on a new or edited code.
    pub fn validate_definition(&self) -> Result<(), PromoError> {
        if self.code.trim().is_empty() {
            return Err(PromoError::InvalidDefinition(
                "code must not be empty".into(),
            ));
        }
        if !self.discount_value.is_finite() || self.discount_value <= 0.0 {
            return Err(PromoError::InvalidDefinition(
                "discount value must be greater than 0".into(),
            ));
        }
        if self.discount_type == DiscountType::Percentage && self.discount_value > 100.0 {
            return Err(PromoError::InvalidDefinition(
                "a percentage discount cannot exceed 100".into(),
            ));
        }
        if self.end_date <= self.start_date {
            return Err(PromoError::InvalidDefinition(
                "end date must be after start date".into(),
            ));
        }
        Ok(())
    }

    fn matches(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }
}

/// A validated promo code, ready to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoGrant {
    /// Code that produced the grant.
    pub promo_code_id: PromoCodeId,
    /// Percentage or fixed.
    pub discount_type: DiscountType,
    /// Percent or amount in the sender's currency.
    pub discount_value: f64,
}

/// Checks a promo code against a corridor and a user.
///
/// Implementations must be `Send + Sync` so a single validator can be
/// shared behind an `Arc`.
pub trait PromoValidator: Send + Sync {
    /// Validate `code` for a transfer on `corridor` by `user`.
    fn validate(
        &self,
        code: &str,
        corridor: Corridor,
        user: Option<UserId>,
    ) -> Result<PromoGrant, PromoError>;
}

/// Adjust a fee fraction by a promo grant.
///
/// A percentage discount scales the fee fraction; a fixed discount is turned
/// into a fraction of `send_principal`. Never negative.
pub fn apply_promo(fee_percentage: f64, grant: &PromoGrant, send_principal: f64) -> f64 {
    let adjusted = match grant.discount_type {
        DiscountType::Percentage => fee_percentage * (1.0 - grant.discount_value / 100.0),
        DiscountType::Fixed => {
            if send_principal > 0.0 {
                fee_percentage - grant.discount_value / send_principal
            } else {
                fee_percentage
            }
        }
    };
    adjusted.max(0.0)
}

/// Promo codes and redemptions held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPromoBook {
    codes: Vec<PromoCode>,
    redemptions: HashSet<(PromoCodeId, UserId)>,
}

impl InMemoryPromoBook {
    /// An empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a code after admin validation.
    pub fn insert(&mut self, code: PromoCode) -> Result<(), PromoError> {
        code.validate_definition()?;
        self.codes.push(code);
        Ok(())
    }

    /// Record that `user` redeemed `code`, bumping its usage counter.
    pub fn record_redemption(&mut self, code: PromoCodeId, user: UserId) {
        if self.redemptions.insert((code, user)) {
            if let Some(c) = self.codes.iter_mut().find(|c| c.id == code) {
                c.current_uses += 1;
            }
        }
    }

    /// All codes.
    pub fn codes(&self) -> &[PromoCode] {
        &self.codes
    }

    /// Validate against an explicit clock.
    pub fn validate_at(
        &self,
        code: &str,
        corridor: Corridor,
        user: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<PromoGrant, PromoError> {
        let promo = self
            .codes
            .iter()
            .find(|c| c.matches(code))
            .ok_or_else(|| PromoError::Unknown(code.to_string()))?;
        let name = promo.code.clone();

        if !promo.active {
            return Err(PromoError::Inactive(name));
        }
        if now < promo.start_date {
            return Err(PromoError::NotYetValid {
                code: name,
                starts_at: promo.start_date,
            });
        }
        if now > promo.end_date {
            return Err(PromoError::Expired {
                code: name,
                ended_at: promo.end_date,
            });
        }
        if let Some(max_uses) = promo.max_uses {
            if promo.current_uses >= max_uses {
                return Err(PromoError::Exhausted {
                    code: name,
                    max_uses,
                });
            }
        }
        if promo.direction != corridor {
            return Err(PromoError::WrongCorridor {
                code: name,
                valid_for: promo.direction,
                requested: corridor,
            });
        }
        if let Some(owner) = promo.user_id {
            if user != Some(owner) {
                return Err(PromoError::ReservedForAnotherUser(name));
            }
        }
        if let Some(user) = user {
            if self.redemptions.contains(&(promo.id, user)) {
                return Err(PromoError::AlreadyUsed(name));
            }
        }

        Ok(PromoGrant {
            promo_code_id: promo.id,
            discount_type: promo.discount_type,
            discount_value: promo.discount_value,
        })
    }
}

impl PromoValidator for InMemoryPromoBook {
    fn validate(
        &self,
        code: &str,
        corridor: Corridor,
        user: Option<UserId>,
    ) -> Result<PromoGrant, PromoError> {
        self.validate_at(code, corridor, user, Utc::now())
    }
}

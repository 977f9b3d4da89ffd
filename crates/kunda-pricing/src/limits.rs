//! # Transfer Limits
//!
//! Two caps apply before a transfer is submitted:
//!
//! - a per-transfer maximum, expressed in EUR;
//! - a weekly cap on what one sender sends to one beneficiary from Gabon,
//!   over a trailing 7-day window, also in EUR.
//!
//! A beneficiary is the same person when the email matches, the phone
//! matches, or the full name matches case-insensitively.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use kunda_core::{format_amount, Corridor, Currency, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SourceError;
use crate::source::RateSource;

/// Default per-transfer maximum in EUR.
pub const DEFAULT_MAX_AMOUNT_PER_TRANSFER_EUR: f64 = 500.0;
/// Default weekly cap in EUR.
pub const DEFAULT_WEEKLY_LIMIT_EUR: f64 = 300.0;
/// Highest weekly cap an administrator may configure.
pub const MAX_CONFIGURABLE_WEEKLY_LIMIT_EUR: f64 = 10_000.0;
/// Length of the weekly window.
pub const WEEKLY_WINDOW_DAYS: i64 = 7;

/// Limit check failure (as opposed to a rejection).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LimitError {
    /// Weekly cap outside (0, 10 000].
    #[error("weekly limit must be greater than 0 and at most {max} EUR (got {value})")]
    InvalidLimit {
        /// Proposed value.
        value: f64,
        /// Highest accepted value.
        max: f64,
    },

    /// No EUR rate to convert an amount.
    #[error("no EUR exchange rate for {0}")]
    RateUnavailable(Currency),

    /// The limit service could not be reached.
    #[error("limit check unavailable: {0}")]
    Backend(#[from] SourceError),
}

/// Outcome of a limit check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitCheck {
    /// Whether the transfer may proceed.
    pub allowed: bool,
    /// Explanation shown to the user.
    pub message: String,
}

impl LimitCheck {
    /// The transfer may proceed.
    pub fn allowed(message: impl Into<String>) -> Self {
        Self {
            allowed: true,
            message: message.into(),
        }
    }

    /// The transfer is blocked.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            message: message.into(),
        }
    }
}

/// Configured limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferLimits {
    /// Per-transfer maximum in EUR.
    pub max_amount_per_transfer_eur: f64,
    /// Weekly cap per sender and beneficiary in EUR.
    pub weekly_limit_eur: f64,
}

impl Default for TransferLimits {
    fn default() -> Self {
        Self {
            max_amount_per_transfer_eur: DEFAULT_MAX_AMOUNT_PER_TRANSFER_EUR,
            weekly_limit_eur: DEFAULT_WEEKLY_LIMIT_EUR,
        }
    }
}

impl TransferLimits {
    /// Check one transfer against the per-transfer maximum.
    pub fn check_transfer_amount(&self, amount_eur: f64) -> LimitCheck {
        if amount_eur > self.max_amount_per_transfer_eur {
            LimitCheck::rejected(format!(
                "The maximum amount per transfer is {} EUR",
                format_amount(self.max_amount_per_transfer_eur, Currency::Eur)
            ))
        } else {
            LimitCheck::allowed("Amount within the per-transfer limit")
        }
    }
}

/// Validate a weekly cap proposed by an administrator.
pub fn validate_weekly_limit(value: f64) -> Result<f64, LimitError> {
    if !value.is_finite() || value <= 0.0 || value > MAX_CONFIGURABLE_WEEKLY_LIMIT_EUR {
        return Err(LimitError::InvalidLimit {
            value,
            max: MAX_CONFIGURABLE_WEEKLY_LIMIT_EUR,
        });
    }
    Ok(value)
}

/// Who receives a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

impl Beneficiary {
    /// Whether two records designate the same person.
    pub fn same_person(&self, other: &Beneficiary) -> bool {
        let email = !self.email.trim().is_empty()
            && self.email.trim().eq_ignore_ascii_case(other.email.trim());
        let phone = match (&self.phone, &other.phone) {
            (Some(a), Some(b)) => !a.trim().is_empty() && a.trim() == b.trim(),
            _ => false,
        };
        let name = !(self.first_name.trim().is_empty() && self.last_name.trim().is_empty())
            && self
                .first_name
                .trim()
                .eq_ignore_ascii_case(other.first_name.trim())
            && self
                .last_name
                .trim()
                .eq_ignore_ascii_case(other.last_name.trim());
        email || phone || name
    }
}

/// A transfer already made, as seen by the weekly check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastTransfer {
    /// Sender.
    pub sender: UserId,
    /// Recipient.
    pub beneficiary: Beneficiary,
    /// Amount sent, in `currency`.
    pub amount: f64,
    /// Origin currency.
    pub currency: Currency,
    /// When it was made.
    pub created_at: DateTime<Utc>,
}

/// A transfer about to be made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyLimitRequest {
    /// Sender.
    pub sender: UserId,
    /// Recipient.
    pub beneficiary: Beneficiary,
    /// Route.
    pub corridor: Corridor,
    /// Amount to send, in `currency`.
    pub amount: f64,
    /// Origin currency.
    pub currency: Currency,
}

/// Checks the weekly cap for a transfer.
pub trait WeeklyLimitChecker: Send + Sync {
    /// Check `request` against the weekly cap.
    fn check(&self, request: &WeeklyLimitRequest) -> Result<LimitCheck, LimitError>;
}

/// The weekly-cap arithmetic over an explicit history.
pub struct WeeklyLimitPolicy {
    limit_eur: f64,
    rates: Arc<dyn RateSource>,
}

impl std::fmt::Debug for WeeklyLimitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeeklyLimitPolicy")
            .field("limit_eur", &self.limit_eur)
            .finish_non_exhaustive()
    }
}

impl WeeklyLimitPolicy {
    /// A policy capping at `limit_eur`, converting amounts with `rates`.
    pub fn new(limit_eur: f64, rates: Arc<dyn RateSource>) -> Result<Self, LimitError> {
        Ok(Self {
            limit_eur: validate_weekly_limit(limit_eur)?,
            rates,
        })
    }

    /// The cap in EUR.
    pub fn limit_eur(&self) -> f64 {
        self.limit_eur
    }

    fn to_eur(&self, amount: f64, currency: Currency) -> Result<f64, LimitError> {
        if currency == Currency::Eur {
            return Ok(amount);
        }
        match self.rates.rate(currency, Currency::Eur)? {
            Some(r) if r > 0.0 => Ok(amount * r),
            _ => Err(LimitError::RateUnavailable(currency)),
        }
    }

    /// Check `request` against `history` as of `now`.
    pub fn check(
        &self,
        history: &[PastTransfer],
        request: &WeeklyLimitRequest,
        now: DateTime<Utc>,
    ) -> Result<LimitCheck, LimitError> {
        if !request.corridor.is_outbound_from_home() {
            return Ok(LimitCheck::allowed(
                "Weekly limit only applies to transfers from Gabon",
            ));
        }

        let window_start = now - Duration::days(WEEKLY_WINDOW_DAYS);
        let mut sent_eur = 0.0;
        for t in history.iter().filter(|t| {
            t.sender == request.sender
                && t.created_at > window_start
                && t.created_at <= now
                && t.beneficiary.same_person(&request.beneficiary)
        }) {
            sent_eur += self.to_eur(t.amount, t.currency)?;
        }

        let new_eur = self.to_eur(request.amount, request.currency)?;
        let remaining = (self.limit_eur - sent_eur).max(0.0);
        tracing::debug!(sent_eur, new_eur, limit_eur = self.limit_eur, "weekly limit check");

        if sent_eur + new_eur > self.limit_eur {
            Ok(LimitCheck::rejected(format!(
                "Weekly limit of {} EUR to this beneficiary exceeded: {} EUR already sent in the last 7 days, {} EUR remaining",
                format_amount(self.limit_eur, Currency::Eur),
                format_amount(sent_eur, Currency::Eur),
                format_amount(remaining, Currency::Eur),
            )))
        } else {
            Ok(LimitCheck::allowed(format!(
                "{} EUR remaining this week for this beneficiary",
                format_amount(remaining - new_eur, Currency::Eur)
            )))
        }
    }
}

/// A weekly-cap checker over a transfer history held in memory.
#[derive(Debug)]
pub struct LocalWeeklyLimit {
    policy: WeeklyLimitPolicy,
    history: Vec<PastTransfer>,
}

impl LocalWeeklyLimit {
    /// Check against `history` with `policy`.
    pub fn new(policy: WeeklyLimitPolicy, history: Vec<PastTransfer>) -> Self {
        Self { policy, history }
    }

    /// Record a completed transfer.
    pub fn record(&mut self, transfer: PastTransfer) {
        self.history.push(transfer);
    }
}

impl WeeklyLimitChecker for LocalWeeklyLimit {
    fn check(&self, request: &WeeklyLimitRequest) -> Result<LimitCheck, LimitError> {
        self.policy.check(&self.history, request, Utc::now())
    }
}

//! # Loyalty Points
//!
//! Users earn points on transfers into Gabon and spend them on transfers out
//! of Gabon. A point is worth 0.01 EUR; the discount is converted into the
//! transfer currency and comes off the platform fee amount.
//!
//! ## Rules
//!
//! - Only corridors originating in Gabon accept points.
//! - At least [`MIN_POINTS_TO_USE`] points must be held and spent.
//! - At most [`MAX_POINTS_PER_TRANSACTION`] points per transfer.
//! - The discount never exceeds [`MAX_DISCOUNT_PERCENTAGE`] % of the
//!   transfer amount; the points spent shrink to match the cap.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use kunda_core::{Corridor, Currency, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SourceError;
use crate::source::RateSource;
use crate::tables::StaticTables;

/// Points earned per whole EUR transferred.
pub const POINTS_PER_EUR: u32 = 1;
/// Value of one point in EUR.
pub const EUR_VALUE_PER_POINT: f64 = 0.01;
/// Cap on the discount as a percentage of the transfer amount.
pub const MAX_DISCOUNT_PERCENTAGE: f64 = 50.0;
/// Cap on points spent on one transfer.
pub const MAX_POINTS_PER_TRANSACTION: u32 = 5_000;
/// Minimum balance and spend.
pub const MIN_POINTS_TO_USE: u32 = 100;

/// Loyalty lookup failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoyaltyError {
    /// No EUR rate for the transfer currency.
    #[error("no EUR exchange rate for {0}")]
    RateUnavailable(Currency),

    /// The loyalty service could not be reached.
    #[error("loyalty service unavailable: {0}")]
    Backend(#[from] SourceError),
}

/// The result of spending points on a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyDiscount {
    /// Discount in the transfer currency.
    pub discount_amount: f64,
    /// Discount as a percentage of the transfer amount.
    pub discount_percentage: f64,
    /// Points actually spent.
    pub points_used: u32,
    /// Balance left after spending.
    pub remaining_points: u32,
}

impl LoyaltyDiscount {
    /// No discount; the balance is untouched.
    pub fn none(balance: u32) -> Self {
        Self {
            discount_amount: 0.0,
            discount_percentage: 0.0,
            points_used: 0,
            remaining_points: balance,
        }
    }
}

/// Converts a user's points into a fee discount.
pub trait LoyaltyService: Send + Sync {
    /// Spend up to `points_to_use` of `user`'s points on a transfer of
    /// `transfer_amount` in `currency`.
    fn discount(
        &self,
        user: UserId,
        points_to_use: u32,
        transfer_amount: f64,
        currency: Currency,
    ) -> Result<LoyaltyDiscount, LoyaltyError>;
}

/// Whether a corridor accepts loyalty points.
pub fn is_eligible(corridor: Corridor) -> bool {
    corridor.is_outbound_from_home()
}

/// Points earned by a transfer of `amount_eur` on `corridor`.
pub fn points_earned(amount_eur: f64, corridor: Corridor) -> u32 {
    if !corridor.is_inbound_to_home() || !amount_eur.is_finite() || amount_eur <= 0.0 {
        return 0;
    }
    (amount_eur.floor() as u32).saturating_mul(POINTS_PER_EUR)
}

/// The points-to-discount arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoyaltyPolicy;

impl LoyaltyPolicy {
    /// Compute the discount for spending `requested` out of `balance` points
    /// on `transfer_amount`, where one EUR is worth `eur_rate` units of the
    /// transfer currency.
    pub fn compute(
        &self,
        balance: u32,
        requested: u32,
        transfer_amount: f64,
        eur_rate: f64,
    ) -> LoyaltyDiscount {
        let usable = requested.min(balance).min(MAX_POINTS_PER_TRANSACTION);
        if balance < MIN_POINTS_TO_USE
            || usable < MIN_POINTS_TO_USE
            || !(transfer_amount > 0.0)
            || !(eur_rate > 0.0)
        {
            return LoyaltyDiscount::none(balance);
        }

        let value_per_point = EUR_VALUE_PER_POINT * eur_rate;
        let mut discount = f64::from(usable) * value_per_point;
        let mut points_used = usable;

        let cap = transfer_amount * MAX_DISCOUNT_PERCENTAGE / 100.0;
        if discount > cap {
            discount = cap;
            points_used = ((cap / value_per_point - 1e-9).ceil() as u32).min(usable);
        }

        LoyaltyDiscount {
            discount_amount: discount,
            discount_percentage: discount / transfer_amount * 100.0,
            points_used,
            remaining_points: balance - points_used,
        }
    }
}

/// Point balances held in memory, priced through a [`RateSource`].
pub struct InMemoryLoyaltyLedger {
    balances: RwLock<HashMap<UserId, u32>>,
    rates: Arc<dyn RateSource>,
    policy: LoyaltyPolicy,
}

impl std::fmt::Debug for InMemoryLoyaltyLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLoyaltyLedger")
            .field("rates", &self.rates.source_name())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryLoyaltyLedger {
    fn default() -> Self {
        Self::new(Arc::new(StaticTables::defaults()))
    }
}

impl InMemoryLoyaltyLedger {
    /// An empty ledger converting EUR values with `rates`.
    pub fn new(rates: Arc<dyn RateSource>) -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
            rates,
            policy: LoyaltyPolicy,
        }
    }

    /// Set a user's balance.
    pub fn set_balance(&self, user: UserId, points: u32) {
        if let Ok(mut b) = self.balances.write() {
            b.insert(user, points);
        }
    }

    /// A user's balance; zero for unknown users.
    pub fn balance(&self, user: UserId) -> u32 {
        self.balances
            .read()
            .ok()
            .and_then(|b| b.get(&user).copied())
            .unwrap_or(0)
    }

    /// Credit points earned by a transfer on `corridor`.
    pub fn credit_transfer(&self, user: UserId, amount_eur: f64, corridor: Corridor) -> u32 {
        let earned = points_earned(amount_eur, corridor);
        if earned > 0 {
            if let Ok(mut b) = self.balances.write() {
                let entry = b.entry(user).or_insert(0);
                *entry = entry.saturating_add(earned);
            }
        }
        earned
    }

    fn eur_rate(&self, currency: Currency) -> Result<f64, LoyaltyError> {
        if currency == Currency::Eur {
            return Ok(1.0);
        }
        match self.rates.rate(Currency::Eur, currency)? {
            Some(r) if r > 0.0 => Ok(r),
            _ => Err(LoyaltyError::RateUnavailable(currency)),
        }
    }
}

impl LoyaltyService for InMemoryLoyaltyLedger {
    fn discount(
        &self,
        user: UserId,
        points_to_use: u32,
        transfer_amount: f64,
        currency: Currency,
    ) -> Result<LoyaltyDiscount, LoyaltyError> {
        let balance = self.balance(user);
        let rate = self.eur_rate(currency)?;
        Ok(self
            .policy
            .compute(balance, points_to_use, transfer_amount, rate))
    }
}

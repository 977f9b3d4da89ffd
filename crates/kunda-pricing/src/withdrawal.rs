//! # Withdrawal Fees — Mobile-Money Cash-Out in Gabon
//!
//! Airtel Money and Moov Money charge the recipient to cash out. A sender
//! may choose to cover that fee so the recipient nets the quoted amount.
//!
//! ## Schedule (XAF)
//!
//! | Amount                      | Fee                                      |
//! |-----------------------------|------------------------------------------|
//! | up to the tier ceiling      | 3 %, rounded to the nearest 5            |
//! | ceiling < amount ≤ 500 000  | 5 000 flat                               |
//! | above 500 000               | 5 000 per full tranche + remainder's fee |
//!
//! The tier ceiling is 166 670 XAF for Airtel Money and 160 000 XAF for
//! Moov Money. A ceiling amount itself falls in the percentage tier.

use kunda_core::{format_amount, Corridor, Currency, Rail};
use kunda_core::currency::{round_to_step, XAF_STEP};
use serde::{Deserialize, Serialize};

/// Percentage charged in the lower tier.
pub const WITHDRAWAL_PERCENTAGE: f64 = 0.03;
/// Flat fee of the upper tier and of each full tranche.
pub const WITHDRAWAL_FLAT_FEE: f64 = 5_000.0;
/// Size of one tranche.
pub const TRANCHE_SIZE: f64 = 500_000.0;

/// Cash-out fee schedule of one mobile-money operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalSchedule {
    /// Operator rail.
    pub rail: Rail,
    /// Highest amount charged as a percentage.
    pub percentage_ceiling: f64,
    /// Lower-tier percentage as a fraction.
    pub percentage: f64,
    /// Upper-tier flat fee.
    pub flat_fee: f64,
    /// Tranche size above which amounts are split.
    pub tranche_size: f64,
}

/// One line of a withdrawal-fee breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalFeeLine {
    /// Portion of the amount this line covers.
    pub amount: f64,
    /// Fee charged on that portion.
    pub fee: f64,
    /// Human-readable explanation.
    pub description: String,
}

/// A computed withdrawal fee.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WithdrawalFee {
    /// Total fee, a multiple of 5 XAF.
    pub total: f64,
    /// Per-tier breakdown.
    pub lines: Vec<WithdrawalFeeLine>,
}

impl WithdrawalSchedule {
    /// Airtel Money Gabon.
    pub const AIRTEL_MONEY: Self = Self {
        rail: Rail::AirtelMoney,
        percentage_ceiling: 166_670.0,
        percentage: WITHDRAWAL_PERCENTAGE,
        flat_fee: WITHDRAWAL_FLAT_FEE,
        tranche_size: TRANCHE_SIZE,
    };

    /// Moov Money Gabon.
    pub const MOOV_MONEY: Self = Self {
        rail: Rail::MoovMoney,
        percentage_ceiling: 160_000.0,
        percentage: WITHDRAWAL_PERCENTAGE,
        flat_fee: WITHDRAWAL_FLAT_FEE,
        tranche_size: TRANCHE_SIZE,
    };

    /// Schedule for a receiving rail, if it charges for cash-out.
    pub fn for_rail(rail: Rail) -> Option<Self> {
        match rail {
            Rail::AirtelMoney => Some(Self::AIRTEL_MONEY),
            Rail::MoovMoney => Some(Self::MOOV_MONEY),
            _ => None,
        }
    }

    /// Schedule for a transfer, if its payout incurs a cash-out fee.
    pub fn for_transfer(corridor: Corridor, receiving: Rail) -> Option<Self> {
        if corridor.is_inbound_to_home() && corridor.destination_currency() == Currency::Xaf {
            Self::for_rail(receiving)
        } else {
            None
        }
    }

    /// Fee for cashing out `amount` XAF.
    pub fn compute(&self, amount: f64) -> WithdrawalFee {
        if !amount.is_finite() || amount <= 0.0 {
            return WithdrawalFee::default();
        }

        let mut lines = Vec::new();
        if amount <= self.tranche_size {
            lines.push(self.tier_line(amount, false));
        } else {
            let tranches = (amount / self.tranche_size).floor();
            let remainder = amount - tranches * self.tranche_size;
            lines.push(WithdrawalFeeLine {
                amount: tranches * self.tranche_size,
                fee: tranches * self.flat_fee,
                description: format!(
                    "{tranches} tranche(s) of {} XAF at {} XAF each",
                    format_amount(self.tranche_size, Currency::Xaf),
                    format_amount(self.flat_fee, Currency::Xaf),
                ),
            });
            if remainder > 0.0 {
                lines.push(self.tier_line(remainder, true));
            }
        }

        let total = round_to_step(lines.iter().map(|l| l.fee).sum(), XAF_STEP);
        WithdrawalFee { total, lines }
    }

    fn tier_line(&self, amount: f64, remainder: bool) -> WithdrawalFeeLine {
        let what = if remainder { "remainder of " } else { "" };
        if amount <= self.percentage_ceiling {
            WithdrawalFeeLine {
                amount,
                fee: round_to_step(amount * self.percentage, XAF_STEP),
                description: format!(
                    "{}% on {what}{} XAF",
                    self.percentage * 100.0,
                    format_amount(amount, Currency::Xaf)
                ),
            }
        } else {
            WithdrawalFeeLine {
                amount,
                fee: self.flat_fee,
                description: format!(
                    "flat fee on {what}{} to {} XAF",
                    format_amount(self.percentage_ceiling + 1.0, Currency::Xaf),
                    format_amount(self.tranche_size, Currency::Xaf)
                ),
            }
        }
    }
}

//! # Currencies — Codes, Rounding, Display
//!
//! Defines the `Currency` enum and the per-currency rounding rules applied
//! to every amount the stack reports.
//!
//! ## Rounding Invariant
//!
//! Central African CFA francs (XAF) have no sub-unit in circulation and the
//! smallest practical denomination is 5. XAF amounts are therefore always
//! multiples of 5:
//!
//! - amounts the sender pays round **up** ([`Currency::round_origin`]),
//! - amounts the recipient gets round **down** ([`Currency::round_destination`]).
//!
//! Every other currency rounds to 2 decimal places.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// Step for XAF rounding.
pub const XAF_STEP: f64 = 5.0;

/// Absorbs binary floating-point noise before ceiling/flooring, so that
/// `65_200.000_000_000_01` does not round up to `65_205`.
const ROUNDING_TOLERANCE: f64 = 1e-6;

/// Narrow no-break space, the French thousands separator.
const FR_GROUP_SEPARATOR: char = '\u{202F}';

/// Currencies handled by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Central African CFA franc (Gabon).
    Xaf,
    /// West African CFA franc (Senegal).
    Xof,
    /// Euro.
    Eur,
    /// US dollar.
    Usd,
    /// Canadian dollar.
    Cad,
    /// Swiss franc.
    Chf,
    /// Pound sterling.
    Gbp,
    /// Chinese yuan.
    Cny,
    /// Moroccan dirham.
    Mad,
    /// Bitcoin.
    Btc,
}

impl Currency {
    /// All supported currencies.
    pub fn all() -> &'static [Currency] {
        &[
            Self::Xaf,
            Self::Xof,
            Self::Eur,
            Self::Usd,
            Self::Cad,
            Self::Chf,
            Self::Gbp,
            Self::Cny,
            Self::Mad,
            Self::Btc,
        ]
    }

    /// ISO 4217 code (or `BTC`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xaf => "XAF",
            Self::Xof => "XOF",
            Self::Eur => "EUR",
            Self::Usd => "USD",
            Self::Cad => "CAD",
            Self::Chf => "CHF",
            Self::Gbp => "GBP",
            Self::Cny => "CNY",
            Self::Mad => "MAD",
            Self::Btc => "BTC",
        }
    }

    /// Whether amounts in this currency are kept on multiples of 5.
    pub fn uses_step_rounding(&self) -> bool {
        matches!(self, Self::Xaf)
    }

    /// Round an amount the sender pays.
    pub fn round_origin(&self, amount: f64) -> f64 {
        if self.uses_step_rounding() {
            ceil_to_step(amount, XAF_STEP)
        } else {
            round_cents(amount)
        }
    }

    /// Round an amount the recipient gets.
    pub fn round_destination(&self, amount: f64) -> f64 {
        if self.uses_step_rounding() {
            floor_to_step(amount, XAF_STEP)
        } else {
            round_cents(amount)
        }
    }

    /// Round to the nearest representable amount (used for display).
    pub fn round_nearest(&self, amount: f64) -> f64 {
        if self.uses_step_rounding() {
            round_to_step(amount, XAF_STEP)
        } else {
            round_cents(amount)
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownCurrency(s.to_string()))
    }
}

/// Round half away from zero to 2 decimal places.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Round to `places` decimal places.
pub fn round_places(amount: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (amount * factor).round() / factor
}

/// Round up to the next multiple of `step`.
pub fn ceil_to_step(amount: f64, step: f64) -> f64 {
    ((amount / step) - ROUNDING_TOLERANCE).ceil().max(0.0) * step
}

/// Round down to the previous multiple of `step`.
pub fn floor_to_step(amount: f64, step: f64) -> f64 {
    ((amount / step) + ROUNDING_TOLERANCE).floor().max(0.0) * step
}

/// Round to the nearest multiple of `step`.
pub fn round_to_step(amount: f64, step: f64) -> f64 {
    (amount / step).round() * step
}

/// Format an amount for display using French conventions.
///
/// - zero or non-finite amounts render as `0,00`;
/// - XAF rounds to the nearest 5 and prints without decimals;
/// - BTC prints 8 decimals;
/// - everything else prints 2 decimals.
///
/// Thousands are grouped with a narrow no-break space and the decimal
/// separator is a comma.
pub fn format_amount(amount: f64, currency: Currency) -> String {
    if !amount.is_finite() || amount == 0.0 {
        return "0,00".to_string();
    }

    let (rendered, places) = match currency {
        Currency::Xaf => (round_to_step(amount, XAF_STEP), 0),
        Currency::Btc => (amount, 8),
        _ => (amount, 2),
    };

    let raw = format!("{:.*}", places, rendered.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut out = String::with_capacity(raw.len() + 4);
    if rendered < 0.0 && raw.chars().any(|c| c != '0' && c != '.') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(FR_GROUP_SEPARATOR);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("xaf".parse::<Currency>().unwrap(), Currency::Xaf);
        assert_eq!(" EUR ".parse::<Currency>().unwrap(), Currency::Eur);
        assert!("ZZZ".parse::<Currency>().is_err());
    }

    #[test]
    fn serde_uses_upper_case_codes() {
        assert_eq!(serde_json::to_string(&Currency::Mad).unwrap(), "\"MAD\"");
        let c: Currency = serde_json::from_str("\"XOF\"").unwrap();
        assert_eq!(c, Currency::Xof);
    }

    #[test]
    fn xaf_origin_rounds_up_to_five() {
        assert_eq!(Currency::Xaf.round_origin(65_201.0), 65_205.0);
        assert_eq!(Currency::Xaf.round_origin(65_200.0), 65_200.0);
        assert_eq!(Currency::Xaf.round_origin(0.1), 5.0);
    }

    #[test]
    fn xaf_destination_rounds_down_to_five() {
        assert_eq!(Currency::Xaf.round_destination(65_202.424), 65_200.0);
        assert_eq!(Currency::Xaf.round_destination(4.99), 0.0);
    }

    #[test]
    fn float_noise_does_not_bump_a_step() {
        let noisy = 0.1 + 0.2; // 0.30000000000000004
        assert_eq!(Currency::Xaf.round_origin(noisy * 1000.0), 300.0);
        assert_eq!(Currency::Xaf.round_destination(64_999.999_999_9), 65_000.0);
    }

    #[test]
    fn other_currencies_round_to_cents() {
        assert_eq!(Currency::Eur.round_origin(99.406), 99.41);
        assert_eq!(Currency::Eur.round_destination(0.604), 0.6);
        assert_eq!(Currency::Mad.round_nearest(10.756), 10.76);
    }

    #[test]
    fn format_xaf_groups_and_drops_decimals() {
        assert_eq!(format_amount(65_202.4, Currency::Xaf), "65\u{202F}200");
        assert_eq!(format_amount(1_234_567.0, Currency::Xaf), "1\u{202F}234\u{202F}565");
    }

    #[test]
    fn format_eur_uses_decimal_comma() {
        assert_eq!(format_amount(1234.5, Currency::Eur), "1\u{202F}234,50");
        assert_eq!(format_amount(0.6, Currency::Eur), "0,60");
    }

    #[test]
    fn format_btc_keeps_eight_decimals() {
        assert_eq!(format_amount(0.5, Currency::Btc), "0,50000000");
    }

    #[test]
    fn format_zero_and_nan() {
        assert_eq!(format_amount(0.0, Currency::Xaf), "0,00");
        assert_eq!(format_amount(f64::NAN, Currency::Eur), "0,00");
    }

    #[test]
    fn format_negative_amount() {
        assert_eq!(format_amount(-12.5, Currency::Usd), "-12,50");
    }

    proptest! {
        /// XAF amounts rounded either way are exact multiples of 5.
        #[test]
        fn xaf_rounding_lands_on_step(x in 0.0f64..10_000_000.0) {
            let up = Currency::Xaf.round_origin(x);
            let down = Currency::Xaf.round_destination(x);
            prop_assert_eq!(up % 5.0, 0.0);
            prop_assert_eq!(down % 5.0, 0.0);
            prop_assert!(up + 1e-3 >= x);
            prop_assert!(down <= x + 1e-3);
            prop_assert!(up - down <= 5.0);
        }
    }
}

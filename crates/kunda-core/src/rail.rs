//! # Rails — Payment and Cash-Out Methods
//!
//! A rail is the method a sender pays with or the method a recipient is
//! paid out on. Most rails work in both directions; card push networks
//! (Visa Direct, Mastercard Send) only pay out.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// A payment or cash-out method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rail {
    /// Airtel Money mobile wallet.
    AirtelMoney,
    /// Moov Money mobile wallet.
    MoovMoney,
    /// Cash at an agent.
    Cash,
    /// Bank transfer.
    BankTransfer,
    /// Alipay wallet.
    Alipay,
    /// Debit or credit card.
    Card,
    /// US ACH transfer.
    Ach,
    /// PayPal.
    Paypal,
    /// Wero (European instant payments wallet).
    Wero,
    /// Bitcoin.
    Bitcoin,
    /// Orange Money mobile wallet.
    OrangeMoney,
    /// Wave mobile wallet.
    Wave,
    /// Visa Direct card push. Receive only.
    VisaDirect,
    /// Mastercard Send card push. Receive only.
    MastercardSend,
}

impl Rail {
    /// All known rails.
    pub fn all() -> &'static [Rail] {
        &[
            Self::AirtelMoney,
            Self::MoovMoney,
            Self::Cash,
            Self::BankTransfer,
            Self::Alipay,
            Self::Card,
            Self::Ach,
            Self::Paypal,
            Self::Wero,
            Self::Bitcoin,
            Self::OrangeMoney,
            Self::Wave,
            Self::VisaDirect,
            Self::MastercardSend,
        ]
    }

    /// Wire name, e.g. `AIRTEL_MONEY`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AirtelMoney => "AIRTEL_MONEY",
            Self::MoovMoney => "MOOV_MONEY",
            Self::Cash => "CASH",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Alipay => "ALIPAY",
            Self::Card => "CARD",
            Self::Ach => "ACH",
            Self::Paypal => "PAYPAL",
            Self::Wero => "WERO",
            Self::Bitcoin => "BITCOIN",
            Self::OrangeMoney => "ORANGE_MONEY",
            Self::Wave => "WAVE",
            Self::VisaDirect => "VISA_DIRECT",
            Self::MastercardSend => "MASTERCARD_SEND",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AirtelMoney => "Airtel Money",
            Self::MoovMoney => "Moov Money",
            Self::Cash => "Espèces",
            Self::BankTransfer => "Virement bancaire",
            Self::Alipay => "Alipay",
            Self::Card => "Carte bancaire",
            Self::Ach => "Virement ACH",
            Self::Paypal => "PayPal",
            Self::Wero => "Wero",
            Self::Bitcoin => "Bitcoin",
            Self::OrangeMoney => "Orange Money",
            Self::Wave => "Wave",
            Self::VisaDirect => "Visa Direct",
            Self::MastercardSend => "Mastercard Send",
        }
    }

    /// Whether a sender can pay with this rail.
    pub fn can_pay(&self) -> bool {
        !matches!(self, Self::VisaDirect | Self::MastercardSend)
    }

    /// Whether a recipient can be paid out on this rail.
    pub fn can_receive(&self) -> bool {
        true
    }

    /// Whether this is a mobile-money wallet.
    pub fn is_mobile_money(&self) -> bool {
        matches!(
            self,
            Self::AirtelMoney | Self::MoovMoney | Self::OrangeMoney | Self::Wave
        )
    }
}

impl std::fmt::Display for Rail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rail {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownRail(s.to_string()))
    }
}

/// The (payment, receiving) rail combination chosen for a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RailPair {
    /// How the sender pays.
    pub payment: Rail,
    /// How the recipient is paid out.
    pub receiving: Rail,
}

impl RailPair {
    /// Build a pair, checking each rail works on its side.
    pub fn new(payment: Rail, receiving: Rail) -> Result<Self, ValidationError> {
        if !payment.can_pay() {
            return Err(ValidationError::RailSideMismatch {
                rail: payment.as_str().to_string(),
                side: "payment",
            });
        }
        if !receiving.can_receive() {
            return Err(ValidationError::RailSideMismatch {
                rail: receiving.as_str().to_string(),
                side: "receiving",
            });
        }
        Ok(Self { payment, receiving })
    }
}

impl std::fmt::Display for RailPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.payment, self.receiving)
    }
}

//! # Countries
//!
//! The fixed set of countries the platform serves, with the currency each
//! one settles in and the upper-case token used to spell corridors
//! (`FRANCE_TO_GABON`).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::currency::Currency;
use crate::error::ValidationError;

/// A served country, identified by its ISO 3166-1 alpha-2 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Country {
    /// Gabon, the platform's home country.
    GA,
    /// France.
    FR,
    /// Belgium.
    BE,
    /// Germany.
    DE,
    /// Switzerland.
    CH,
    /// United Kingdom.
    GB,
    /// Spain.
    ES,
    /// Italy.
    IT,
    /// Netherlands.
    NL,
    /// United States.
    US,
    /// Canada.
    CA,
    /// China.
    CN,
    /// Morocco.
    MA,
    /// Senegal.
    SN,
}

/// The platform's home country. Loyalty points, weekly caps and
/// mobile-money withdrawal fees are all defined relative to it.
pub const HOME_COUNTRY: Country = Country::GA;

impl Country {
    /// All served countries.
    pub fn all() -> &'static [Country] {
        &[
            Self::GA,
            Self::FR,
            Self::BE,
            Self::DE,
            Self::CH,
            Self::GB,
            Self::ES,
            Self::IT,
            Self::NL,
            Self::US,
            Self::CA,
            Self::CN,
            Self::MA,
            Self::SN,
        ]
    }

    /// ISO alpha-2 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GA => "GA",
            Self::FR => "FR",
            Self::BE => "BE",
            Self::DE => "DE",
            Self::CH => "CH",
            Self::GB => "GB",
            Self::ES => "ES",
            Self::IT => "IT",
            Self::NL => "NL",
            Self::US => "US",
            Self::CA => "CA",
            Self::CN => "CN",
            Self::MA => "MA",
            Self::SN => "SN",
        }
    }

    /// Token used in corridor names.
    pub fn corridor_token(&self) -> &'static str {
        match self {
            Self::GA => "GABON",
            Self::FR => "FRANCE",
            Self::BE => "BELGIUM",
            Self::DE => "GERMANY",
            Self::CH => "SWITZERLAND",
            Self::GB => "UK",
            Self::ES => "SPAIN",
            Self::IT => "ITALY",
            Self::NL => "NETHERLANDS",
            Self::US => "USA",
            Self::CA => "CANADA",
            Self::CN => "CHINA",
            Self::MA => "MOROCCO",
            Self::SN => "SENEGAL",
        }
    }

    /// Display name, in the platform's user-facing language.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GA => "Gabon",
            Self::FR => "France",
            Self::BE => "Belgique",
            Self::DE => "Allemagne",
            Self::CH => "Suisse",
            Self::GB => "Royaume-Uni",
            Self::ES => "Espagne",
            Self::IT => "Italie",
            Self::NL => "Pays-Bas",
            Self::US => "États-Unis",
            Self::CA => "Canada",
            Self::CN => "Chine",
            Self::MA => "Maroc",
            Self::SN => "Sénégal",
        }
    }

    /// Settlement currency.
    pub fn currency(&self) -> Currency {
        match self {
            Self::GA => Currency::Xaf,
            Self::SN => Currency::Xof,
            Self::MA => Currency::Mad,
            Self::FR | Self::BE | Self::DE | Self::ES | Self::IT | Self::NL => Currency::Eur,
            Self::CH => Currency::Chf,
            Self::GB => Currency::Gbp,
            Self::US => Currency::Usd,
            Self::CA => Currency::Cad,
            Self::CN => Currency::Cny,
        }
    }

    /// Parse a corridor token (`GABON`, `UK`, ...).
    pub fn from_corridor_token(token: &str) -> Result<Self, ValidationError> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.corridor_token() == token)
            .ok_or_else(|| ValidationError::UnknownCountry(token.to_string()))
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Country {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownCountry(s.to_string()))
    }
}

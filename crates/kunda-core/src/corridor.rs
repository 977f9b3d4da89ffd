//! # Corridors — Directed Transfer Routes
//!
//! A corridor is an ordered (origin, destination) country pair drawn from a
//! fixed allow-list. It fixes the currency pair of a transfer and is the key
//! under which fees and promo codes are scoped.
//!
//! ## Wire Format
//!
//! Corridors serialize as `ORIGIN_TO_DESTINATION` using the country corridor
//! tokens, e.g. `FRANCE_TO_GABON` or `GABON_TO_UK`. Deserialization routes
//! through [`Corridor::new`], so a route that is not on the allow-list is
//! rejected at the boundary.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::country::{Country, HOME_COUNTRY};
use crate::currency::Currency;
use crate::error::ValidationError;

const SEPARATOR: &str = "_TO_";

/// Served routes, grouped by origin.
const ROUTES: &[(Country, &[Country])] = &[
    (
        Country::GA,
        &[
            Country::FR,
            Country::BE,
            Country::DE,
            Country::CN,
            Country::US,
            Country::CA,
            Country::CH,
            Country::GB,
            Country::ES,
            Country::IT,
            Country::NL,
            Country::MA,
            Country::SN,
        ],
    ),
    (Country::FR, &[Country::GA, Country::MA, Country::SN]),
    (Country::MA, &[Country::GA, Country::SN, Country::FR]),
    (Country::SN, &[Country::GA, Country::FR, Country::MA]),
    (Country::BE, &[Country::GA]),
    (Country::DE, &[Country::GA]),
    (Country::CH, &[Country::GA]),
    (Country::GB, &[Country::GA]),
    (Country::ES, &[Country::GA]),
    (Country::IT, &[Country::GA]),
    (Country::NL, &[Country::GA]),
    (Country::US, &[Country::GA]),
    (Country::CA, &[Country::GA]),
];

/// A served, directed transfer route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Corridor {
    origin: Country,
    destination: Country,
}

impl Corridor {
    /// Build a corridor, rejecting pairs that are not served.
    pub fn new(origin: Country, destination: Country) -> Result<Self, ValidationError> {
        if !Self::is_served(origin, destination) {
            return Err(ValidationError::InvalidCorridor(format!(
                "{}{SEPARATOR}{}",
                origin.corridor_token(),
                destination.corridor_token()
            )));
        }
        Ok(Self {
            origin,
            destination,
        })
    }

    /// Whether `origin → destination` is on the allow-list.
    pub fn is_served(origin: Country, destination: Country) -> bool {
        ROUTES
            .iter()
            .any(|(o, dests)| *o == origin && dests.contains(&destination))
    }

    /// Every served corridor, grouped by origin.
    pub fn all() -> Vec<Corridor> {
        ROUTES
            .iter()
            .flat_map(|(origin, dests)| {
                dests.iter().map(move |destination| Corridor {
                    origin: *origin,
                    destination: *destination,
                })
            })
            .collect()
    }

    /// Destinations reachable from `origin`.
    pub fn destinations_from(origin: Country) -> &'static [Country] {
        ROUTES
            .iter()
            .find(|(o, _)| *o == origin)
            .map(|(_, dests)| *dests)
            .unwrap_or(&[])
    }

    /// Sending country.
    pub fn origin(&self) -> Country {
        self.origin
    }

    /// Receiving country.
    pub fn destination(&self) -> Country {
        self.destination
    }

    /// Currency the sender pays in.
    pub fn origin_currency(&self) -> Currency {
        self.origin.currency()
    }

    /// Currency the recipient is paid in.
    pub fn destination_currency(&self) -> Currency {
        self.destination.currency()
    }

    /// Whether the transfer leaves the home country.
    pub fn is_outbound_from_home(&self) -> bool {
        self.origin == HOME_COUNTRY
    }

    /// Whether the transfer lands in the home country.
    pub fn is_inbound_to_home(&self) -> bool {
        self.destination == HOME_COUNTRY
    }

    /// The same route travelled the other way, if it is served.
    pub fn reversed(&self) -> Option<Corridor> {
        Corridor::new(self.destination, self.origin).ok()
    }
}

impl std::fmt::Display for Corridor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}",
            self.origin.corridor_token(),
            self.destination.corridor_token()
        )
    }
}

impl FromStr for Corridor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let (origin, destination) = normalized
            .split_once(SEPARATOR)
            .ok_or_else(|| ValidationError::InvalidCorridor(s.to_string()))?;
        let origin = Country::from_corridor_token(origin)
            .map_err(|_| ValidationError::InvalidCorridor(s.to_string()))?;
        let destination = Country::from_corridor_token(destination)
            .map_err(|_| ValidationError::InvalidCorridor(s.to_string()))?;
        Corridor::new(origin, destination)
    }
}

impl TryFrom<String> for Corridor {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Corridor> for String {
    fn from(c: Corridor) -> Self {
        c.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_roundtrip() {
        let c: Corridor = "FRANCE_TO_GABON".parse().unwrap();
        assert_eq!(c.origin(), Country::FR);
        assert_eq!(c.destination(), Country::GA);
        assert_eq!(c.to_string(), "FRANCE_TO_GABON");
    }

    #[test]
    fn parse_is_case_insensitive() {
        let c: Corridor = "gabon_to_uk".parse().unwrap();
        assert_eq!(c.destination(), Country::GB);
    }

    #[test]
    fn unserved_pair_is_rejected() {
        // China only receives.
        assert!(Corridor::new(Country::CN, Country::GA).is_err());
        // Europe-to-Europe is not a route.
        assert!(Corridor::new(Country::FR, Country::BE).is_err());
        assert!(matches!(
            "BELGIUM_TO_FRANCE".parse::<Corridor>(),
            Err(ValidationError::InvalidCorridor(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("FRANCE-GABON".parse::<Corridor>().is_err());
        assert!("ATLANTIS_TO_GABON".parse::<Corridor>().is_err());
    }

    #[test]
    fn currencies_come_from_countries() {
        let c = Corridor::new(Country::MA, Country::SN).unwrap();
        assert_eq!(c.origin_currency(), Currency::Mad);
        assert_eq!(c.destination_currency(), Currency::Xof);
    }

    #[test]
    fn home_direction_flags() {
        let out = Corridor::new(Country::GA, Country::FR).unwrap();
        assert!(out.is_outbound_from_home());
        assert!(!out.is_inbound_to_home());
        assert_eq!(out.reversed().unwrap().to_string(), "FRANCE_TO_GABON");
        assert!(Corridor::new(Country::GA, Country::CN).unwrap().reversed().is_none());
    }

    #[test]
    fn all_contains_every_route_once() {
        let all = Corridor::all();
        assert_eq!(all.len(), 13 + 3 + 3 + 3 + 9);
        let mut dedup = all.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), all.len());
    }

    #[test]
    fn serde_as_string() {
        let c = Corridor::new(Country::SN, Country::MA).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"SENEGAL_TO_MOROCCO\"");
        let back: Corridor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert!(serde_json::from_str::<Corridor>("\"CHINA_TO_GABON\"").is_err());
    }
}

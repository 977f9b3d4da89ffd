//! # Configuration Sources — Rates and Fee Rules
//!
//! The calculator never embeds literal tables. It asks a [`RateSource`] for
//! the exchange rate of a currency pair and a [`FeeSource`] for the fee
//! fraction of a (corridor, payment rail, receiving rail) combination.
//!
//! ## Architecture
//!
//! Two implementations exist: the remote backend (`kunda-client`) and the
//! built-in [`StaticTables`](crate::tables::StaticTables). [`FallbackSource`]
//! composes them so the backend is preferred and the static defaults answer
//! when the backend is down or has no row for the key.
//!
//! A lookup returns `Ok(None)` for "no entry" and `Err` for "could not ask".
//! Both fall through to the fallback; only the error is logged at `warn`.

use std::sync::Arc;

use kunda_core::{Corridor, Currency, RailPair};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Key of a fee rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeKey {
    /// Route the transfer takes.
    pub corridor: Corridor,
    /// Payment and receiving rails.
    pub rails: RailPair,
}

impl FeeKey {
    /// Build a key.
    pub fn new(corridor: Corridor, rails: RailPair) -> Self {
        Self { corridor, rails }
    }
}

impl std::fmt::Display for FeeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} via {}", self.corridor, self.rails)
    }
}

/// Common identity of every configuration source.
pub trait ConfigSource: Send + Sync {
    /// Human-readable name of this source (e.g. "static-tables").
    fn source_name(&self) -> &str;
}

/// Provider of exchange rates.
pub trait RateSource: ConfigSource {
    /// Units of `to` per unit of `from`, or `None` when unknown.
    fn rate(&self, from: Currency, to: Currency) -> Result<Option<f64>, SourceError>;
}

/// Provider of fee rules.
pub trait FeeSource: ConfigSource {
    /// Fee as a fraction of the principal (0.006 = 0.6 %), or `None` when
    /// the combination is not offered.
    fn fee_percentage(&self, key: &FeeKey) -> Result<Option<f64>, SourceError>;
}

impl<T: ConfigSource + ?Sized> ConfigSource for Arc<T> {
    fn source_name(&self) -> &str {
        (**self).source_name()
    }
}

impl<T: RateSource + ?Sized> RateSource for Arc<T> {
    fn rate(&self, from: Currency, to: Currency) -> Result<Option<f64>, SourceError> {
        (**self).rate(from, to)
    }
}

impl<T: FeeSource + ?Sized> FeeSource for Arc<T> {
    fn fee_percentage(&self, key: &FeeKey) -> Result<Option<f64>, SourceError> {
        (**self).fee_percentage(key)
    }
}

/// Primary source with a fallback, chosen per lookup by availability.
#[derive(Debug, Clone)]
pub struct FallbackSource<P, F> {
    primary: P,
    fallback: F,
    name: String,
}

impl<P: ConfigSource, F: ConfigSource> FallbackSource<P, F> {
    /// Chain `primary` in front of `fallback`.
    pub fn new(primary: P, fallback: F) -> Self {
        let name = format!("{}+{}", primary.source_name(), fallback.source_name());
        Self {
            primary,
            fallback,
            name,
        }
    }

    /// The preferred source.
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// The source consulted when the primary cannot answer.
    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    fn resolve<T>(
        &self,
        what: &str,
        primary: Result<Option<T>, SourceError>,
        fallback: impl FnOnce() -> Result<Option<T>, SourceError>,
    ) -> Result<Option<T>, SourceError> {
        match primary {
            Ok(Some(v)) => Ok(Some(v)),
            Ok(None) => {
                tracing::debug!(
                    source = self.primary.source_name(),
                    key = what,
                    "no entry in primary source, using fallback"
                );
                fallback()
            }
            Err(e) => {
                tracing::warn!(
                    source = self.primary.source_name(),
                    key = what,
                    error = %e,
                    "primary source failed, using fallback"
                );
                fallback()
            }
        }
    }
}

impl<P: ConfigSource, F: ConfigSource> ConfigSource for FallbackSource<P, F> {
    fn source_name(&self) -> &str {
        &self.name
    }
}

impl<P: RateSource, F: RateSource> RateSource for FallbackSource<P, F> {
    fn rate(&self, from: Currency, to: Currency) -> Result<Option<f64>, SourceError> {
        let key = format!("{from}->{to}");
        self.resolve(&key, self.primary.rate(from, to), || {
            self.fallback.rate(from, to)
        })
    }
}

impl<P: FeeSource, F: FeeSource> FeeSource for FallbackSource<P, F> {
    fn fee_percentage(&self, key: &FeeKey) -> Result<Option<f64>, SourceError> {
        let what = key.to_string();
        self.resolve(&what, self.primary.fee_percentage(key), || {
            self.fallback.fee_percentage(key)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::StaticTables;
    use kunda_core::{Country, Rail};

    /// A source that always fails, standing in for an unreachable backend.
    struct Down;

    impl ConfigSource for Down {
        fn source_name(&self) -> &str {
            "down"
        }
    }

    impl RateSource for Down {
        fn rate(&self, _: Currency, _: Currency) -> Result<Option<f64>, SourceError> {
            Err(SourceError::Unavailable {
                backend: "down".into(),
                reason: "connection refused".into(),
            })
        }
    }

    impl FeeSource for Down {
        fn fee_percentage(&self, _: &FeeKey) -> Result<Option<f64>, SourceError> {
            Err(SourceError::Unavailable {
                backend: "down".into(),
                reason: "connection refused".into(),
            })
        }
    }

    /// A source that knows a single overridden rate and nothing else.
    struct OneRate(f64);

    impl ConfigSource for OneRate {
        fn source_name(&self) -> &str {
            "one-rate"
        }
    }

    impl RateSource for OneRate {
        fn rate(&self, from: Currency, to: Currency) -> Result<Option<f64>, SourceError> {
            Ok((from == Currency::Eur && to == Currency::Xaf).then_some(self.0))
        }
    }

    fn fr_to_ga_card_airtel() -> FeeKey {
        FeeKey::new(
            Corridor::new(Country::FR, Country::GA).unwrap(),
            RailPair::new(Rail::Card, Rail::AirtelMoney).unwrap(),
        )
    }

    #[test]
    fn primary_error_falls_back() {
        let src = FallbackSource::new(Down, StaticTables::defaults());
        assert_eq!(src.rate(Currency::Eur, Currency::Xaf).unwrap(), Some(655.96));
        assert_eq!(
            src.fee_percentage(&fr_to_ga_card_airtel()).unwrap(),
            Some(0.006)
        );
    }

    #[test]
    fn primary_hit_wins() {
        let src = FallbackSource::new(OneRate(650.0), StaticTables::defaults());
        assert_eq!(src.rate(Currency::Eur, Currency::Xaf).unwrap(), Some(650.0));
    }

    #[test]
    fn primary_miss_falls_back() {
        let src = FallbackSource::new(OneRate(650.0), StaticTables::defaults());
        assert_eq!(src.rate(Currency::Eur, Currency::Mad).unwrap(), Some(10.75));
    }

    #[test]
    fn fallback_miss_is_none() {
        let src = FallbackSource::new(Down, StaticTables::defaults());
        assert_eq!(src.rate(Currency::Usd, Currency::Btc).unwrap(), None);
    }

    #[test]
    fn both_down_is_error() {
        let src = FallbackSource::new(Down, Down);
        assert!(src.rate(Currency::Eur, Currency::Xaf).is_err());
    }

    #[test]
    fn composed_name() {
        let src = FallbackSource::new(Down, StaticTables::defaults());
        assert_eq!(src.source_name(), "down+static-tables");
    }

    #[test]
    fn arc_dyn_sources_compose() {
        let primary: Arc<dyn RateSource> = Arc::new(Down);
        let fallback: Arc<dyn RateSource> = Arc::new(StaticTables::defaults());
        let src = FallbackSource::new(primary, fallback);
        assert_eq!(src.rate(Currency::Xaf, Currency::Xof).unwrap(), Some(1.0));
    }
}

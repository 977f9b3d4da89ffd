//! # Static Tables — Built-in Rates and Fee Rules
//!
//! The defaults the stack prices from when no backend is configured or the
//! backend cannot answer. Fee rules are declared per corridor group as a list
//! of (payment, receiving) rail pairs; [`StaticTables::defaults`] expands
//! them into one row per corridor and rail pair.
//!
//! The tables can also be built from explicit rows (e.g. loaded from a YAML
//! configuration file) with [`StaticTables::from_entries`].

use kunda_core::{Corridor, Country, Currency, Rail, RailPair};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::source::{ConfigSource, FeeKey, FeeSource, RateSource};

/// One exchange-rate row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
    /// Units of `to` per unit of `from`.
    pub rate: f64,
}

/// One fee-rule row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeEntry {
    /// Route the rule applies to.
    pub corridor: Corridor,
    /// Rail the sender pays with.
    pub payment_method: Rail,
    /// Rail the recipient is paid out on.
    pub receiving_method: Rail,
    /// Fee as a fraction of the principal.
    pub fee_percentage: f64,
}

const fn rate(from: Currency, to: Currency, rate: f64) -> RateEntry {
    RateEntry { from, to, rate }
}

/// Default exchange rates.
pub const DEFAULT_RATES: &[RateEntry] = &[
    rate(Currency::Eur, Currency::Xaf, 655.96),
    rate(Currency::Xaf, Currency::Eur, 0.001524),
    rate(Currency::Eur, Currency::Xof, 655.96),
    rate(Currency::Xof, Currency::Eur, 0.001524),
    rate(Currency::Eur, Currency::Mad, 10.75),
    rate(Currency::Mad, Currency::Eur, 0.093023),
    rate(Currency::Xaf, Currency::Xof, 1.0),
    rate(Currency::Xof, Currency::Xaf, 1.0),
    rate(Currency::Xaf, Currency::Mad, 0.016393),
    rate(Currency::Mad, Currency::Xaf, 61.01953),
    rate(Currency::Xof, Currency::Mad, 0.016393),
    rate(Currency::Mad, Currency::Xof, 61.01953),
    rate(Currency::Eur, Currency::Cny, 7.5099),
    rate(Currency::Cny, Currency::Eur, 0.133157),
    rate(Currency::Xaf, Currency::Cny, 0.011445),
    rate(Currency::Cny, Currency::Xaf, 87.34),
];

/// A fee rule shared by several routes and rail pairs.
#[derive(Debug, Clone, Copy)]
pub struct FeeGroup {
    /// Sending countries.
    pub origins: &'static [Country],
    /// Receiving countries.
    pub destinations: &'static [Country],
    /// Allowed (payment, receiving) combinations.
    pub rails: &'static [(Rail, Rail)],
    /// Fee fraction.
    pub fee_percentage: f64,
}

const EUROZONE_TO_GABON: &[Country] = &[
    Country::FR,
    Country::BE,
    Country::DE,
    Country::ES,
    Country::IT,
    Country::NL,
];

const EUROPE: &[Country] = &[
    Country::FR,
    Country::BE,
    Country::DE,
    Country::CH,
    Country::GB,
    Country::ES,
    Country::IT,
    Country::NL,
];

const EUROPE_PAY_INTO_GABON: &[(Rail, Rail)] = &[
    (Rail::BankTransfer, Rail::AirtelMoney),
    (Rail::BankTransfer, Rail::Cash),
    (Rail::Wero, Rail::AirtelMoney),
    (Rail::Wero, Rail::Cash),
    (Rail::Card, Rail::AirtelMoney),
    (Rail::Card, Rail::Cash),
    (Rail::Paypal, Rail::AirtelMoney),
    (Rail::Paypal, Rail::Cash),
];

const GABON_PAY_INTO_EUROPE: &[(Rail, Rail)] = &[
    (Rail::AirtelMoney, Rail::BankTransfer),
    (Rail::Cash, Rail::BankTransfer),
    (Rail::AirtelMoney, Rail::Wero),
    (Rail::Cash, Rail::Wero),
    (Rail::AirtelMoney, Rail::Paypal),
];

/// Default fee rules.
pub const DEFAULT_FEES: &[FeeGroup] = &[
    FeeGroup {
        origins: EUROZONE_TO_GABON,
        destinations: &[Country::GA],
        rails: EUROPE_PAY_INTO_GABON,
        fee_percentage: 0.006,
    },
    FeeGroup {
        origins: &[Country::CH, Country::GB],
        destinations: &[Country::GA],
        rails: EUROPE_PAY_INTO_GABON,
        fee_percentage: 0.008,
    },
    FeeGroup {
        origins: &[Country::FR],
        destinations: &[Country::MA],
        rails: &[
            (Rail::Card, Rail::OrangeMoney),
            (Rail::BankTransfer, Rail::OrangeMoney),
            (Rail::Paypal, Rail::OrangeMoney),
            (Rail::Wero, Rail::OrangeMoney),
        ],
        fee_percentage: 0.009,
    },
    FeeGroup {
        origins: &[Country::FR],
        destinations: &[Country::SN],
        rails: &[
            (Rail::Card, Rail::Wave),
            (Rail::BankTransfer, Rail::Wave),
            (Rail::Paypal, Rail::Wave),
            (Rail::Wero, Rail::Wave),
        ],
        fee_percentage: 0.009,
    },
    FeeGroup {
        origins: &[Country::GA],
        destinations: &[Country::MA],
        rails: &[
            (Rail::AirtelMoney, Rail::OrangeMoney),
            (Rail::MoovMoney, Rail::OrangeMoney),
            (Rail::Cash, Rail::OrangeMoney),
        ],
        fee_percentage: 0.09,
    },
    FeeGroup {
        origins: &[Country::MA],
        destinations: &[Country::GA],
        rails: &[
            (Rail::OrangeMoney, Rail::AirtelMoney),
            (Rail::OrangeMoney, Rail::MoovMoney),
            (Rail::OrangeMoney, Rail::Cash),
        ],
        fee_percentage: 0.09,
    },
    FeeGroup {
        origins: &[Country::MA],
        destinations: &[Country::SN],
        rails: &[(Rail::OrangeMoney, Rail::Wave)],
        fee_percentage: 0.09,
    },
    FeeGroup {
        origins: &[Country::SN],
        destinations: &[Country::MA],
        rails: &[(Rail::Wave, Rail::OrangeMoney)],
        fee_percentage: 0.09,
    },
    FeeGroup {
        origins: &[Country::MA],
        destinations: &[Country::FR],
        rails: &[
            (Rail::OrangeMoney, Rail::BankTransfer),
            (Rail::OrangeMoney, Rail::Wero),
            (Rail::OrangeMoney, Rail::Paypal),
        ],
        fee_percentage: 0.09,
    },
    FeeGroup {
        origins: &[Country::SN],
        destinations: &[Country::FR],
        rails: &[
            (Rail::Wave, Rail::BankTransfer),
            (Rail::Wave, Rail::Wero),
            (Rail::Wave, Rail::Paypal),
        ],
        fee_percentage: 0.09,
    },
    FeeGroup {
        origins: &[Country::GA],
        destinations: EUROPE,
        rails: GABON_PAY_INTO_EUROPE,
        fee_percentage: 0.08,
    },
    FeeGroup {
        origins: &[Country::GA],
        destinations: &[Country::SN],
        rails: &[
            (Rail::AirtelMoney, Rail::Wave),
            (Rail::MoovMoney, Rail::Wave),
            (Rail::Cash, Rail::Wave),
        ],
        fee_percentage: 0.09,
    },
    FeeGroup {
        origins: &[Country::SN],
        destinations: &[Country::GA],
        rails: &[
            (Rail::Wave, Rail::AirtelMoney),
            (Rail::Wave, Rail::MoovMoney),
            (Rail::Wave, Rail::Cash),
        ],
        fee_percentage: 0.09,
    },
    FeeGroup {
        origins: &[Country::GA],
        destinations: &[Country::CN],
        rails: &[(Rail::AirtelMoney, Rail::Alipay)],
        fee_percentage: 0.085,
    },
    FeeGroup {
        origins: &[Country::GA],
        destinations: &[Country::CN],
        rails: &[(Rail::Cash, Rail::Alipay)],
        fee_percentage: 0.075,
    },
];

/// In-memory rate and fee tables.
#[derive(Debug, Clone, Default)]
pub struct StaticTables {
    rates: Vec<RateEntry>,
    fees: Vec<FeeEntry>,
}

impl StaticTables {
    /// The built-in defaults.
    pub fn defaults() -> Self {
        let mut fees = Vec::new();
        for group in DEFAULT_FEES {
            for origin in group.origins {
                for destination in group.destinations {
                    // Grouped routes are all on the allow-list.
                    let Ok(corridor) = Corridor::new(*origin, *destination) else {
                        continue;
                    };
                    for (payment, receiving) in group.rails {
                        fees.push(FeeEntry {
                            corridor,
                            payment_method: *payment,
                            receiving_method: *receiving,
                            fee_percentage: group.fee_percentage,
                        });
                    }
                }
            }
        }
        Self {
            rates: DEFAULT_RATES.to_vec(),
            fees,
        }
    }

    /// Tables built from explicit rows. Later rows override earlier ones.
    pub fn from_entries(rates: Vec<RateEntry>, fees: Vec<FeeEntry>) -> Self {
        Self { rates, fees }
    }

    /// Replace or add rows on top of the current tables.
    pub fn with_overrides(mut self, rates: &[RateEntry], fees: &[FeeEntry]) -> Self {
        self.rates.extend_from_slice(rates);
        self.fees.extend_from_slice(fees);
        self
    }

    /// Every rate row.
    pub fn rate_entries(&self) -> &[RateEntry] {
        &self.rates
    }

    /// Every fee row.
    pub fn fee_entries(&self) -> &[FeeEntry] {
        &self.fees
    }

    /// Rail pairs with a fee rule on `corridor`, in table order.
    pub fn rails_for(&self, corridor: Corridor) -> Vec<RailPair> {
        let mut pairs: Vec<RailPair> = Vec::new();
        for entry in self.fees.iter().filter(|e| e.corridor == corridor) {
            let pair = RailPair {
                payment: entry.payment_method,
                receiving: entry.receiving_method,
            };
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }

    fn lookup_rate(&self, from: Currency, to: Currency) -> Option<f64> {
        self.rates
            .iter()
            .rev()
            .find(|e| e.from == from && e.to == to)
            .map(|e| e.rate)
    }

    fn lookup_fee(&self, key: &FeeKey) -> Option<f64> {
        self.fees
            .iter()
            .rev()
            .find(|e| {
                e.corridor == key.corridor
                    && e.payment_method == key.rails.payment
                    && e.receiving_method == key.rails.receiving
            })
            .map(|e| e.fee_percentage)
    }
}

impl ConfigSource for StaticTables {
    fn source_name(&self) -> &str {
        "static-tables"
    }
}

impl RateSource for StaticTables {
    fn rate(&self, from: Currency, to: Currency) -> Result<Option<f64>, SourceError> {
        Ok(self.lookup_rate(from, to))
    }
}

impl FeeSource for StaticTables {
    fn fee_percentage(&self, key: &FeeKey) -> Result<Option<f64>, SourceError> {
        Ok(self.lookup_fee(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(o: Country, d: Country, p: Rail, r: Rail) -> FeeKey {
        FeeKey::new(Corridor::new(o, d).unwrap(), RailPair::new(p, r).unwrap())
    }

    fn fee(o: Country, d: Country, p: Rail, r: Rail) -> Option<f64> {
        StaticTables::defaults()
            .fee_percentage(&key(o, d, p, r))
            .unwrap()
    }

    #[test]
    fn default_rates() {
        let t = StaticTables::defaults();
        assert_eq!(t.rate(Currency::Eur, Currency::Xaf).unwrap(), Some(655.96));
        assert_eq!(t.rate(Currency::Mad, Currency::Xof).unwrap(), Some(61.01953));
        assert_eq!(t.rate(Currency::Cny, Currency::Xaf).unwrap(), Some(87.34));
        assert_eq!(t.rate(Currency::Usd, Currency::Xaf).unwrap(), None);
    }

    #[test]
    fn europe_into_gabon() {
        assert_eq!(
            fee(Country::FR, Country::GA, Rail::Card, Rail::AirtelMoney),
            Some(0.006)
        );
        assert_eq!(
            fee(Country::NL, Country::GA, Rail::Paypal, Rail::Cash),
            Some(0.006)
        );
        assert_eq!(
            fee(Country::GB, Country::GA, Rail::Wero, Rail::Cash),
            Some(0.008)
        );
        // Moov is not a payout rail for Europe.
        assert_eq!(
            fee(Country::FR, Country::GA, Rail::Card, Rail::MoovMoney),
            None
        );
    }

    #[test]
    fn gabon_outbound() {
        assert_eq!(
            fee(Country::GA, Country::CH, Rail::Cash, Rail::Wero),
            Some(0.08)
        );
        assert_eq!(
            fee(Country::GA, Country::FR, Rail::Cash, Rail::Paypal),
            None
        );
        assert_eq!(
            fee(Country::GA, Country::CN, Rail::AirtelMoney, Rail::Alipay),
            Some(0.085)
        );
        assert_eq!(
            fee(Country::GA, Country::CN, Rail::Cash, Rail::Alipay),
            Some(0.075)
        );
        assert_eq!(
            fee(Country::GA, Country::SN, Rail::MoovMoney, Rail::Wave),
            Some(0.09)
        );
    }

    #[test]
    fn africa_corridors() {
        assert_eq!(
            fee(Country::MA, Country::SN, Rail::OrangeMoney, Rail::Wave),
            Some(0.09)
        );
        assert_eq!(
            fee(Country::SN, Country::FR, Rail::Wave, Rail::Wero),
            Some(0.09)
        );
        assert_eq!(
            fee(Country::FR, Country::SN, Rail::Paypal, Rail::Wave),
            Some(0.009)
        );
    }

    #[test]
    fn unpriced_corridor_has_no_rails() {
        let t = StaticTables::defaults();
        assert!(t
            .rails_for(Corridor::new(Country::US, Country::GA).unwrap())
            .is_empty());
        let fr_ga = t.rails_for(Corridor::new(Country::FR, Country::GA).unwrap());
        assert_eq!(fr_ga.len(), 8);
        assert_eq!(fr_ga[0], RailPair::new(Rail::BankTransfer, Rail::AirtelMoney).unwrap());
    }

    #[test]
    fn overrides_win() {
        let t = StaticTables::defaults().with_overrides(
            &[rate(Currency::Eur, Currency::Xaf, 650.0)],
            &[],
        );
        assert_eq!(t.rate(Currency::Eur, Currency::Xaf).unwrap(), Some(650.0));
    }

    #[test]
    fn fee_entry_yaml_shape() {
        let json = r#"{"corridor":"FRANCE_TO_GABON","payment_method":"CARD","receiving_method":"CASH","fee_percentage":0.005}"#;
        let e: FeeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(e.payment_method, Rail::Card);
        assert_eq!(e.corridor.to_string(), "FRANCE_TO_GABON");
    }
}

//! # Rates and Fees Subcommands
//!
//! `kunda rates` prints one exchange rate (backend first, built-in tables as
//! fallback) or the whole built-in rate table. `kunda fees` lists the rail
//! pairs offered on a corridor with their fee percentage.

use anyhow::{Context as _, Result};
use clap::Args;
use kunda_core::{Corridor, Currency};
use kunda_pricing::source::FeeKey;
use kunda_pricing::tables::RateEntry;
use serde::Serialize;

use crate::Context;

/// Arguments for the `kunda rates` subcommand.
#[derive(Args, Debug)]
pub struct RatesArgs {
    /// Source currency.
    #[arg(long, requires = "to")]
    pub from: Option<Currency>,
    /// Target currency.
    #[arg(long, requires = "from")]
    pub to: Option<Currency>,
}

/// Arguments for the `kunda fees` subcommand.
#[derive(Args, Debug)]
pub struct FeesArgs {
    /// Corridor, e.g. GABON_TO_FRANCE.
    #[arg(long)]
    pub corridor: Corridor,
}

#[derive(Debug, Serialize)]
struct FeeRow {
    payment_method: String,
    receiving_method: String,
    fee_percentage: f64,
}

/// Execute the rates subcommand.
pub fn run_rates(args: &RatesArgs, ctx: &Context) -> Result<u8> {
    if let (Some(from), Some(to)) = (args.from, args.to) {
        let rate = ctx
            .calculator()
            .exchange_rate(from, to)
            .with_context(|| format!("no exchange rate {from} -> {to}"))?;
        let entry = RateEntry { from, to, rate };
        ctx.emit(&entry, || format!("1 {from} = {rate} {to}"))?;
        return Ok(0);
    }

    let entries = ctx.tables.rate_entries();
    ctx.emit(&entries, || {
        entries
            .iter()
            .map(|e| format!("{} -> {}  {}", e.from, e.to, e.rate))
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    Ok(0)
}

/// Execute the fees subcommand.
pub fn run_fees(args: &FeesArgs, ctx: &Context) -> Result<u8> {
    let calc = ctx.calculator();
    let mut rows = Vec::new();
    for rails in ctx.tables.rails_for(args.corridor) {
        let key = FeeKey::new(args.corridor, rails);
        let fee_percentage = calc
            .fee_percentage(&key)
            .with_context(|| format!("no fee for {key}"))?;
        rows.push(FeeRow {
            payment_method: rails.payment.to_string(),
            receiving_method: rails.receiving.to_string(),
            fee_percentage,
        });
    }
    if rows.is_empty() {
        tracing::warn!(corridor = %args.corridor, "no fee rules for corridor");
    }

    ctx.emit(&rows, || {
        rows.iter()
            .map(|r| {
                format!(
                    "{:<16} -> {:<16} {:.2}%",
                    r.payment_method,
                    r.receiving_method,
                    r.fee_percentage * 100.0
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use crate::OutputFormat;

    fn ctx() -> Context {
        Context::new(CliConfig::default(), OutputFormat::Text).unwrap()
    }

    #[test]
    fn single_rate() {
        let args = RatesArgs {
            from: Some(Currency::Eur),
            to: Some(Currency::Xaf),
        };
        assert_eq!(run_rates(&args, &ctx()).unwrap(), 0);
    }

    #[test]
    fn unknown_rate_is_an_error() {
        let args = RatesArgs {
            from: Some(Currency::Btc),
            to: Some(Currency::Cad),
        };
        assert!(run_rates(&args, &ctx()).is_err());
    }

    #[test]
    fn full_table() {
        let args = RatesArgs { from: None, to: None };
        assert_eq!(run_rates(&args, &ctx()).unwrap(), 0);
    }

    #[test]
    fn corridor_fees() {
        let args = FeesArgs {
            corridor: "FRANCE_TO_GABON".parse().unwrap(),
        };
        assert_eq!(run_fees(&args, &ctx()).unwrap(), 0);
    }
}

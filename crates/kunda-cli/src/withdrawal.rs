//! # Withdrawal-Fee Subcommand
//!
//! Prints the mobile-money cash-out fee for an XAF amount, line by line.

use anyhow::{bail, Result};
use clap::Args;
use kunda_core::{format_amount, Currency, Rail};
use kunda_pricing::WithdrawalSchedule;

use crate::Context;

/// Arguments for the `kunda withdrawal-fee` subcommand.
#[derive(Args, Debug)]
pub struct WithdrawalFeeArgs {
    /// Amount to cash out, in XAF.
    pub amount: f64,

    /// Mobile-money operator.
    #[arg(long, default_value = "AIRTEL_MONEY")]
    pub rail: Rail,
}

/// Execute the withdrawal-fee subcommand.
pub fn run_withdrawal_fee(args: &WithdrawalFeeArgs, ctx: &Context) -> Result<u8> {
    if !args.amount.is_finite() || args.amount <= 0.0 {
        bail!("amount must be a positive number (got {})", args.amount);
    }
    let Some(schedule) = WithdrawalSchedule::for_rail(args.rail) else {
        bail!("{} does not charge a withdrawal fee", args.rail.label());
    };
    let fee = schedule.compute(args.amount);

    ctx.emit(&fee, || {
        let mut out = format!(
            "{} withdrawal fee on {} XAF: {} XAF",
            args.rail.label(),
            format_amount(args.amount, Currency::Xaf),
            format_amount(fee.total, Currency::Xaf)
        );
        for line in &fee.lines {
            out.push_str(&format!(
                "\n  {:>12} XAF  {}",
                format_amount(line.fee, Currency::Xaf),
                line.description
            ));
        }
        out
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
    fn operator_rail() {
        let args = WithdrawalFeeArgs {
            amount: 1_000_000.0,
            rail: Rail::MoovMoney,
        };
        assert_eq!(run_withdrawal_fee(&args, &ctx()).unwrap(), 0);
    }

    #[test]
    fn rail_without_schedule() {
        let args = WithdrawalFeeArgs {
            amount: 10_000.0,
            rail: Rail::Cash,
        };
        let err = run_withdrawal_fee(&args, &ctx()).unwrap_err();
        assert!(err.to_string().contains("does not charge"));
    }

    #[test]
    fn non_positive_amount() {
        let args = WithdrawalFeeArgs {
            amount: 0.0,
            rail: Rail::AirtelMoney,
        };
        assert!(run_withdrawal_fee(&args, &ctx()).is_err());
    }
}

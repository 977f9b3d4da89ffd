//! # Limits Subcommand
//!
//! - `show` — Configured per-transfer maximum and weekly cap.
//! - `check` — One amount against the per-transfer maximum.
//! - `weekly` — A transfer against the weekly cap for its beneficiary.
//! - `set-weekly` — Change the weekly cap on the backend.
//!
//! `check` and `weekly` exit 2 when the transfer would be refused.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use kunda_core::{format_amount, Corridor, Currency, UserId};
use kunda_pricing::limits::{
    validate_weekly_limit, Beneficiary, LocalWeeklyLimit, WeeklyLimitRequest,
};
use kunda_pricing::{LimitCheck, WeeklyLimitChecker, WeeklyLimitPolicy};
use serde::Serialize;

use crate::Context;

/// Arguments for the `kunda limits` subcommand.
#[derive(Args, Debug)]
pub struct LimitsArgs {
    #[command(subcommand)]
    pub command: LimitsCommand,
}

/// Limits subcommands.
#[derive(Subcommand, Debug)]
pub enum LimitsCommand {
    /// Show the configured limits.
    Show,

    /// Check an amount against the per-transfer maximum.
    Check {
        /// Amount to send.
        amount: f64,
        /// Currency of the amount.
        #[arg(long, default_value = "EUR")]
        currency: Currency,
    },

    /// Check a transfer against the weekly cap for its beneficiary.
    Weekly(WeeklyArgs),

    /// Set the weekly cap (EUR) on the backend.
    SetWeekly {
        /// New cap, greater than 0 and at most 10 000.
        value: f64,
    },
}

/// A transfer to check against the weekly cap.
#[derive(Args, Debug)]
pub struct WeeklyArgs {
    /// Corridor; the cap only applies to transfers leaving Gabon.
    #[arg(long)]
    pub corridor: Corridor,
    /// Sending user (UUID).
    #[arg(long)]
    pub sender: UserId,
    /// Amount to send, in the corridor's origin currency.
    #[arg(long)]
    pub amount: f64,
    /// Beneficiary given name.
    #[arg(long)]
    pub first_name: String,
    /// Beneficiary family name.
    #[arg(long)]
    pub last_name: String,
    /// Beneficiary email.
    #[arg(long)]
    pub email: String,
    /// Beneficiary phone.
    #[arg(long)]
    pub phone: Option<String>,
}

impl WeeklyArgs {
    fn to_request(&self) -> WeeklyLimitRequest {
        WeeklyLimitRequest {
            sender: self.sender,
            beneficiary: Beneficiary {
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
                email: self.email.clone(),
                phone: self.phone.clone(),
            },
            corridor: self.corridor,
            amount: self.amount,
            currency: self.corridor.origin_currency(),
        }
    }
}

#[derive(Debug, Serialize)]
struct LimitsSummary {
    max_amount_per_transfer_eur: f64,
    weekly_limit_eur: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend_weekly_limit_eur: Option<f64>,
}

/// Execute the limits subcommand.
pub fn run_limits(args: &LimitsArgs, ctx: &Context) -> Result<u8> {
    match &args.command {
        LimitsCommand::Show => cmd_show(ctx),
        LimitsCommand::Check { amount, currency } => cmd_check(ctx, *amount, *currency),
        LimitsCommand::Weekly(weekly) => cmd_weekly(ctx, weekly),
        LimitsCommand::SetWeekly { value } => cmd_set_weekly(ctx, *value),
    }
}

fn cmd_show(ctx: &Context) -> Result<u8> {
    let backend_weekly_limit_eur = match &ctx.backend {
        Some(b) => b
            .fetch_weekly_limit()
            .context("failed to fetch weekly limit")?,
        None => None,
    };
    let summary = LimitsSummary {
        max_amount_per_transfer_eur: ctx.config.limits.max_amount_per_transfer_eur,
        weekly_limit_eur: ctx.config.limits.weekly_limit_eur,
        backend_weekly_limit_eur,
    };
    ctx.emit(&summary, || {
        let mut out = format!(
            "Per transfer:  {} EUR\nWeekly cap:    {} EUR",
            format_amount(summary.max_amount_per_transfer_eur, Currency::Eur),
            format_amount(summary.weekly_limit_eur, Currency::Eur)
        );
        if let Some(v) = summary.backend_weekly_limit_eur {
            out.push_str(&format!(
                "\nBackend cap:   {} EUR",
                format_amount(v, Currency::Eur)
            ));
        }
        out
    })?;
    Ok(0)
}

fn cmd_check(ctx: &Context, amount: f64, currency: Currency) -> Result<u8> {
    if !amount.is_finite() || amount <= 0.0 {
        anyhow::bail!("amount must be a positive number (got {amount})");
    }
    let rate = ctx
        .calculator()
        .exchange_rate(currency, Currency::Eur)
        .with_context(|| format!("no EUR rate for {currency}"))?;
    let check = ctx.config.limits.check_transfer_amount(amount * rate);
    report(ctx, &check)
}

fn cmd_weekly(ctx: &Context, args: &WeeklyArgs) -> Result<u8> {
    let checker: Arc<dyn WeeklyLimitChecker> = match &ctx.backend {
        Some(b) => b.clone(),
        None => {
            tracing::info!("no backend configured; checking the amount alone against the cap");
            let policy = WeeklyLimitPolicy::new(ctx.config.limits.weekly_limit_eur, ctx.rates())
                .context("invalid weekly limit in configuration")?;
            Arc::new(LocalWeeklyLimit::new(policy, Vec::new()))
        }
    };
    let check = checker.check(&args.to_request())?;
    report(ctx, &check)
}

fn cmd_set_weekly(ctx: &Context, value: f64) -> Result<u8> {
    let value = validate_weekly_limit(value)?;
    let backend = ctx.require_backend("changing the weekly limit")?;
    backend.update_weekly_limit(value)?;
    ctx.emit(&serde_json::json!({ "weekly_limit_eur": value }), || {
        format!(
            "Weekly cap set to {} EUR",
            format_amount(value, Currency::Eur)
        )
    })?;
    Ok(0)
}

fn report(ctx: &Context, check: &LimitCheck) -> Result<u8> {
    ctx.emit(check, || {
        let verdict = if check.allowed { "allowed" } else { "refused" };
        format!("{verdict}: {}", check.message)
    })?;
    Ok(if check.allowed { 0 } else { 2 })
}

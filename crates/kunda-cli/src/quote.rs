//! # Quote Subcommand
//!
//! Prices a transfer from the amount the sender pays (`--send`) or the
//! amount the recipient should get (`--receive`), then checks the
//! per-transfer maximum on the EUR value of what is sent.

use anyhow::{Context as _, Result};
use clap::Args;
use kunda_core::{format_amount, Corridor, Currency, Rail, RailPair, UserId};
use kunda_pricing::{QuoteRequest, TransferQuote};
use serde::Serialize;

use crate::Context;

/// Arguments for the `kunda quote` subcommand.
#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Corridor, e.g. FRANCE_TO_GABON.
    #[arg(long)]
    pub corridor: Corridor,

    /// Rail the sender pays with, e.g. CARD.
    #[arg(long)]
    pub pay: Rail,

    /// Rail the recipient is paid on, e.g. AIRTEL_MONEY.
    #[arg(long)]
    pub payout: Rail,

    /// Amount the sender pays, in the origin currency.
    #[arg(long, group = "amount", required_unless_present = "receive")]
    pub send: Option<f64>,

    /// Amount the recipient should get, in the destination currency.
    #[arg(long, group = "amount")]
    pub receive: Option<f64>,

    /// Promo code to apply.
    #[arg(long)]
    pub promo: Option<String>,

    /// Have the sender cover the mobile-money cash-out fee.
    #[arg(long)]
    pub with_withdrawal_fee: bool,

    /// Sending user (UUID), for promo codes and loyalty points.
    #[arg(long)]
    pub user: Option<UserId>,

    /// Loyalty points to spend.
    #[arg(long, default_value_t = 0, requires = "user")]
    pub points: u32,
}

impl QuoteArgs {
    /// The pricing request these arguments describe.
    pub fn to_request(&self) -> Result<QuoteRequest> {
        let rails = RailPair::new(self.pay, self.payout)?;
        let mut req = match (self.send, self.receive) {
            (Some(amount), _) => QuoteRequest::send(amount, self.corridor, rails),
            (None, Some(amount)) => QuoteRequest::receive(amount, self.corridor, rails),
            (None, None) => anyhow::bail!("either --send or --receive is required"),
        };
        if let Some(code) = &self.promo {
            req = req.with_promo_code(code.clone());
        }
        if let Some(user) = self.user {
            req = req.for_user(user);
        }
        Ok(req
            .with_withdrawal_fee(self.with_withdrawal_fee)
            .with_loyalty_points(self.points))
    }
}

#[derive(Debug, Serialize)]
struct QuoteOutput<'a> {
    quote: &'a TransferQuote,
    within_transfer_limit: bool,
    limit_message: String,
}

/// Execute the quote subcommand.
pub fn run_quote(args: &QuoteArgs, ctx: &Context) -> Result<u8> {
    let request = args.to_request()?;
    let quote = ctx
        .calculator()
        .quote(&request)
        .with_context(|| format!("failed to price {} via {}", request.corridor, request.rails))?;

    let eur = sent_in_eur(ctx, &quote)?;
    let check = ctx.config.limits.check_transfer_amount(eur);

    let output = QuoteOutput {
        quote: &quote,
        within_transfer_limit: check.allowed,
        limit_message: check.message.clone(),
    };
    ctx.emit(&output, || render(&quote, &check.message, check.allowed))?;

    Ok(if check.allowed { 0 } else { 2 })
}

fn sent_in_eur(ctx: &Context, quote: &TransferQuote) -> Result<f64> {
    let rate = ctx
        .calculator()
        .exchange_rate(quote.sender_currency, Currency::Eur)
        .with_context(|| format!("no EUR rate for {}", quote.sender_currency))?;
    Ok(quote.amount_sent * rate)
}

fn render(q: &TransferQuote, limit_message: &str, allowed: bool) -> String {
    let from = q.sender_currency;
    let to = q.receiver_currency;
    let mut out = String::new();
    out.push_str(&format!(
        "{} ({} -> {})\n",
        q.corridor, q.payment_method, q.receiving_method
    ));
    out.push_str(&format!("  You send:        {} {from}\n", format_amount(q.amount_sent, from)));
    out.push_str(&format!("  Recipient gets:  {} {to}\n", format_amount(q.amount_received, to)));
    out.push_str(&format!("  Exchange rate:   1 {from} = {} {to}\n", q.exchange_rate));
    out.push_str(&format!(
        "  Fee:             {} {from} ({:.2}%",
        format_amount(q.platform_fee, from),
        q.effective_fee_percentage * 100.0
    ));
    if q.effective_fee_percentage != q.original_fee_percentage {
        out.push_str(&format!(", was {:.2}%", q.original_fee_percentage * 100.0));
    }
    out.push_str(")\n");
    if q.loyalty_points_used > 0 {
        out.push_str(&format!(
            "  Loyalty:         -{} {from} ({} points, {} left)\n",
            format_amount(q.loyalty_discount, from),
            q.loyalty_points_used,
            q.remaining_loyalty_points.unwrap_or(0)
        ));
    }
    if q.withdrawal_fee > 0.0 {
        out.push_str(&format!(
            "  Withdrawal fee:  {} {to} ({} {from})\n",
            format_amount(q.withdrawal_fee, to),
            format_amount(q.withdrawal_fee_in_sender_currency, from)
        ));
        for line in &q.withdrawal_fee_lines {
            out.push_str(&format!("    - {}\n", line.description));
        }
    }
    out.push_str(&format!("  Total fees:      {} {from}\n", format_amount(q.total_fees, from)));
    if !allowed {
        out.push_str(&format!("WARNING: {limit_message}"));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use crate::OutputFormat;
    use kunda_core::Country;

    fn args(send: Option<f64>, receive: Option<f64>) -> QuoteArgs {
        QuoteArgs {
            corridor: Corridor::new(Country::FR, Country::GA).unwrap(),
            pay: Rail::Card,
            payout: Rail::AirtelMoney,
            send,
            receive,
            promo: None,
            with_withdrawal_fee: false,
            user: None,
            points: 0,
        }
    }

    #[test]
    fn request_from_send_side() {
        let req = args(Some(100.0), None).to_request().unwrap();
        assert_eq!(req.amount, 100.0);
        assert_eq!(req.side, kunda_pricing::AmountSide::Send);
    }

    #[test]
    fn request_from_receive_side() {
        let req = args(None, Some(65_200.0)).to_request().unwrap();
        assert_eq!(req.side, kunda_pricing::AmountSide::Receive);
    }

    #[test]
    fn payout_only_rail_cannot_pay() {
        let mut a = args(Some(100.0), None);
        a.pay = Rail::VisaDirect;
        assert!(a.to_request().is_err());
    }

    #[test]
    fn quote_within_limit_exits_zero() {
        let ctx = Context::new(CliConfig::default(), OutputFormat::Json).unwrap();
        assert_eq!(run_quote(&args(Some(100.0), None), &ctx).unwrap(), 0);
    }

    #[test]
    fn quote_over_limit_exits_two() {
        let ctx = Context::new(CliConfig::default(), OutputFormat::Text).unwrap();
        assert_eq!(run_quote(&args(Some(900.0), None), &ctx).unwrap(), 2);
    }

    #[test]
    fn text_rendering_shows_amounts() {
        let ctx = Context::new(CliConfig::default(), OutputFormat::Text).unwrap();
        let req = args(Some(100.0), None).to_request().unwrap();
        let quote = ctx.calculator().quote(&req).unwrap();
        let text = render(&quote, "", true);
        assert!(text.contains("FRANCE_TO_GABON (CARD -> AIRTEL_MONEY)"));
        assert!(text.contains("65\u{202F}200 XAF"));
        assert!(!text.contains("WARNING"));
    }
}

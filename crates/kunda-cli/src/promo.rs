//! # Promo Subcommand
//!
//! Checks a promo code against the backend for a corridor and, optionally,
//! a user. Exits 0 when the code applies and 3 when it is rejected.

use anyhow::Result;
use clap::{Args, Subcommand};
use kunda_core::{Corridor, UserId};
use kunda_pricing::promo::{DiscountType, PromoError};
use kunda_pricing::PromoValidator;
use serde::Serialize;

use crate::Context;

/// Arguments for the `kunda promo` subcommand.
#[derive(Args, Debug)]
pub struct PromoArgs {
    #[command(subcommand)]
    pub command: PromoCommand,
}

/// Promo subcommands.
#[derive(Subcommand, Debug)]
pub enum PromoCommand {
    /// Validate a promo code for a corridor.
    Validate {
        /// Code as the user would type it.
        code: String,
        /// Corridor the transfer would use.
        #[arg(long)]
        corridor: Corridor,
        /// User redeeming the code (UUID).
        #[arg(long)]
        user: Option<UserId>,
    },
}

#[derive(Debug, Serialize)]
struct PromoOutcome {
    valid: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    grant: Option<kunda_pricing::PromoGrant>,
}

/// Execute the promo subcommand.
pub fn run_promo(args: &PromoArgs, ctx: &Context) -> Result<u8> {
    match &args.command {
        PromoCommand::Validate {
            code,
            corridor,
            user,
        } => {
            let backend = ctx.require_backend("promo validation")?;
            let outcome = match backend.validate(code, *corridor, *user) {
                Ok(grant) => PromoOutcome {
                    valid: true,
                    message: match grant.discount_type {
                        DiscountType::Percentage => {
                            format!("{}% off the fee", grant.discount_value)
                        }
                        DiscountType::Fixed => {
                            format!(
                                "{} off the fee, in the sending currency",
                                grant.discount_value
                            )
                        }
                    },
                    grant: Some(grant),
                },
                Err(PromoError::Backend(e)) => return Err(e.into()),
                Err(e) => PromoOutcome {
                    valid: false,
                    message: e.to_string(),
                    grant: None,
                },
            };
            ctx.emit(&outcome, || {
                if outcome.valid {
                    format!("{code}: valid, {}", outcome.message)
                } else {
                    format!("{code}: rejected, {}", outcome.message)
                }
            })?;
            Ok(if outcome.valid { 0 } else { 3 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use crate::OutputFormat;

    #[test]
    fn needs_a_backend() {
        let ctx = Context::new(CliConfig::default(), OutputFormat::Text).unwrap();
        let args = PromoArgs {
            command: PromoCommand::Validate {
                code: "WELCOME".into(),
                corridor: "FRANCE_TO_GABON".parse().unwrap(),
                user: None,
            },
        };
        let err = run_promo(&args, &ctx).unwrap_err();
        assert!(err.to_string().contains("needs a backend"));
    }
}

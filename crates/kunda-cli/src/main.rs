//! # kunda CLI entry point
//!
//! Parses command-line arguments, loads configuration and dispatches to
//! subcommand handlers on a blocking thread of a Tokio runtime, so that the
//! backend client can drive its HTTP requests.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kunda_cli::config::CliConfig;
use kunda_cli::limits::{run_limits, LimitsArgs};
use kunda_cli::promo::{run_promo, PromoArgs};
use kunda_cli::quote::{run_quote, QuoteArgs};
use kunda_cli::reference::{run_reference, ReferenceArgs};
use kunda_cli::tables::{run_fees, run_rates, FeesArgs, RatesArgs};
use kunda_cli::withdrawal::{run_withdrawal_fee, WithdrawalFeeArgs};
use kunda_cli::{run_blocking, Context, OutputFormat};

/// KundaPay pricing CLI
///
/// Quotes transfers, breaks down mobile-money withdrawal fees, inspects
/// exchange rates and fee rules, validates promo codes, generates transfer
/// references and checks transfer limits.
#[derive(Parser, Debug)]
#[command(name = "kunda", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true, env = "KUNDA_CONFIG")]
    config: Option<PathBuf>,

    /// Output format for command results.
    #[arg(long, value_enum, default_value = "text", global = true)]
    output: OutputFormat,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Price a transfer from the amount sent or the amount received.
    Quote(QuoteArgs),

    /// Mobile-money cash-out fee for an XAF amount.
    WithdrawalFee(WithdrawalFeeArgs),

    /// Show one exchange rate or the built-in rate table.
    Rates(RatesArgs),

    /// List the rail pairs and fees offered on a corridor.
    Fees(FeesArgs),

    /// Promo code operations.
    Promo(PromoArgs),

    /// Generate or look up a transfer reference.
    Reference(ReferenceArgs),

    /// Per-transfer and weekly limits.
    Limits(LimitsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level. RUST_LOG wins when set.
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "kunda CLI starting");

    let result = CliConfig::load(cli.config.as_deref())
        .and_then(|config| Context::new(config, cli.output))
        .and_then(|ctx| run_blocking(move || dispatch(cli.command, &ctx))?);

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn dispatch(command: Commands, ctx: &Context) -> anyhow::Result<u8> {
    match command {
        Commands::Quote(args) => run_quote(&args, ctx),
        Commands::WithdrawalFee(args) => run_withdrawal_fee(&args, ctx),
        Commands::Rates(args) => run_rates(&args, ctx),
        Commands::Fees(args) => run_fees(&args, ctx),
        Commands::Promo(args) => run_promo(&args, ctx),
        Commands::Reference(args) => run_reference(&args, ctx),
        Commands::Limits(args) => run_limits(&args, ctx),
    }
}

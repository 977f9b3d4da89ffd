//! # Reference Subcommand
//!
//! Generates a transfer reference that the backend has not issued yet, or
//! a locally unique one when no backend is configured. `--check` looks up
//! an existing reference instead.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use kunda_core::TransferReference;
use kunda_pricing::reference::{
    generate_unique_reference, InMemoryReferenceRegistry, ReferenceRegistry,
};
use serde::Serialize;

use crate::Context;

/// Arguments for the `kunda reference` subcommand.
#[derive(Args, Debug)]
pub struct ReferenceArgs {
    /// Look up this reference instead of generating one.
    #[arg(long)]
    pub check: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReferenceLookup<'a> {
    reference: &'a TransferReference,
    exists: bool,
}

/// Execute the reference subcommand.
pub fn run_reference(args: &ReferenceArgs, ctx: &Context) -> Result<u8> {
    let registry: Arc<dyn ReferenceRegistry> = match &ctx.backend {
        Some(b) => b.clone(),
        None => {
            tracing::info!("no backend configured; references are only unique locally");
            Arc::new(InMemoryReferenceRegistry::new())
        }
    };

    if let Some(raw) = &args.check {
        let reference = TransferReference::parse(raw.trim())?;
        let exists = registry
            .exists(&reference)
            .with_context(|| format!("failed to look up {reference}"))?;
        let lookup = ReferenceLookup {
            reference: &reference,
            exists,
        };
        ctx.emit(&lookup, || {
            format!("{reference}: {}", if exists { "issued" } else { "available" })
        })?;
        return Ok(if exists { 0 } else { 1 });
    }

    let reference = generate_unique_reference(registry.as_ref())?;
    ctx.emit(&reference, || reference.to_string())?;
    Ok(0)
}

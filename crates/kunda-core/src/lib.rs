//! # kunda-core — Foundational Types for the Pricing Stack
//!
//! This crate defines the domain primitives every other crate in the
//! workspace builds on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Closed enums for the fixed catalogues.** `Country`, `Currency` and
//!    `Rail` are exhaustive enums. Adding a country forces every `match` on
//!    it to be revisited at compile time.
//!
//! 2. **`Corridor` is validated at construction.** A corridor can only be
//!    built from a pair on the allow-list, so downstream code never has to
//!    re-check that a route exists.
//!
//! 3. **Rounding lives with the currency.** `Currency::round_up` and
//!    `Currency::round_down` carry the FCFA multiple-of-5 rule; nothing else
//!    in the workspace rounds amounts by hand.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `kunda-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod corridor;
pub mod country;
pub mod currency;
pub mod error;
pub mod identity;
pub mod rail;
pub mod reference;

// Re-export primary types for ergonomic imports.
pub use corridor::Corridor;
pub use country::Country;
pub use currency::{format_amount, Currency};
pub use error::ValidationError;
pub use identity::{PromoCodeId, UserId};
pub use rail::{Rail, RailPair};
pub use reference::TransferReference;

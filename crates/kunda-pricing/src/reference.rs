//! # Unique Transfer References
//!
//! Generates a [`TransferReference`] that has not been issued yet, checking
//! candidates against a [`ReferenceRegistry`].

use std::collections::HashSet;
use std::sync::RwLock;

use chrono::Utc;
use kunda_core::TransferReference;
use thiserror::Error;

use crate::error::SourceError;

/// Attempts before giving up.
pub const MAX_REFERENCE_ATTEMPTS: u32 = 50;

/// Failure to produce a unique reference.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReferenceError {
    /// Every candidate collided or could not be checked.
    #[error("could not generate a unique transfer reference after {attempts} attempts")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
    },
}

/// Lookup of already-issued references.
pub trait ReferenceRegistry: Send + Sync {
    /// Whether `reference` is already taken.
    fn exists(&self, reference: &TransferReference) -> Result<bool, SourceError>;
}

/// Issued references held in memory.
#[derive(Debug, Default)]
pub struct InMemoryReferenceRegistry {
    issued: RwLock<HashSet<TransferReference>>,
}

impl InMemoryReferenceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `reference` as issued. Returns `false` if it already was.
    pub fn insert(&self, reference: TransferReference) -> bool {
        self.issued
            .write()
            .map(|mut set| set.insert(reference))
            .unwrap_or(false)
    }
}

impl ReferenceRegistry for InMemoryReferenceRegistry {
    fn exists(&self, reference: &TransferReference) -> Result<bool, SourceError> {
        self.issued
            .read()
            .map(|set| set.contains(reference))
            .map_err(|_| SourceError::Unavailable {
                backend: "in-memory-references".into(),
                reason: "registry lock poisoned".into(),
            })
    }
}

/// Generate a reference not yet present in `registry`.
///
/// A failed lookup counts as a failed attempt.
pub fn generate_unique_reference(
    registry: &dyn ReferenceRegistry,
) -> Result<TransferReference, ReferenceError> {
    let mut rng = rand::thread_rng();
    for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
        let candidate = TransferReference::generate(Utc::now(), &mut rng);
        match registry.exists(&candidate) {
            Ok(false) => return Ok(candidate),
            Ok(true) => {
                tracing::debug!(attempt, reference = %candidate, "reference already issued");
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "reference lookup failed");
            }
        }
    }
    Err(ReferenceError::Exhausted {
        attempts: MAX_REFERENCE_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Reports every candidate as taken.
    struct Full(AtomicU32);

    impl ReferenceRegistry for Full {
        fn exists(&self, _: &TransferReference) -> Result<bool, SourceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    /// Fails twice, then answers.
    struct Flaky(AtomicU32);

    impl ReferenceRegistry for Flaky {
        fn exists(&self, _: &TransferReference) -> Result<bool, SourceError> {
            if self.0.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(SourceError::Unavailable {
                    backend: "flaky".into(),
                    reason: "timeout".into(),
                })
            } else {
                Ok(false)
            }
        }
    }

    #[test]
    fn fresh_registry_accepts_first_candidate() {
        let registry = InMemoryReferenceRegistry::new();
        let r = generate_unique_reference(&registry).unwrap();
        assert!(r.as_str().starts_with("KP"));
        assert!(registry.insert(r.clone()));
        assert!(!registry.insert(r.clone()));
        assert!(registry.exists(&r).unwrap());
    }

    #[test]
    fn gives_up_after_fifty_attempts() {
        let registry = Full(AtomicU32::new(0));
        assert_eq!(
            generate_unique_reference(&registry),
            Err(ReferenceError::Exhausted { attempts: 50 })
        );
        assert_eq!(registry.0.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn lookup_errors_are_retried() {
        let registry = Flaky(AtomicU32::new(0));
        assert!(generate_unique_reference(&registry).is_ok());
        assert_eq!(registry.0.load(Ordering::SeqCst), 3);
    }
}

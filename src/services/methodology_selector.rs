//! Methodology selector: random, non-repeating choice within a clean streak.
//!
//! Requiring distinct methodologies approximates independent verification: a
//! single methodology reporting clean three times is weaker evidence than
//! three different methodologies agreeing.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ConvergenceSession, MethodologyReuse};

/// Chooses the next methodology uniformly at random from those not yet used
/// under the configured reuse scope.
pub struct MethodologySelector {
    rng: Mutex<StdRng>,
}

impl Default for MethodologySelector {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodologySelector {
    /// Selector seeded from entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Selector with a fixed seed, for deterministic tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick the next methodology for `session`.
    ///
    /// Errors with [`DomainError::NoEligibleMethodology`] when every
    /// methodology has been used under the given scope; callers should size
    /// the available set to at least the clean-streak target.
    pub fn next(
        &self,
        session: &ConvergenceSession,
        reuse: MethodologyReuse,
    ) -> DomainResult<String> {
        let eligible = session.eligible_methodologies(reuse);
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        eligible
            .choose(&mut *rng)
            .map(|&name| name.to_string())
            .ok_or(DomainError::NoEligibleMethodology)
    }
}

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use thiserror::Error;

use crate::content::Identified;

/// Every item of the pool has already been drawn (or the pool is empty).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    #[error("Pool exhausted")]
    Exhausted,
}

/// Identities already drawn from one pool. Only ever grows, except when the
/// owning partition is reset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UsedSet {
    identities: HashSet<String>,
}

impl UsedSet {
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.identities.contains(identity)
    }

    fn insert(&mut self, identity: String) -> bool {
        self.identities.insert(identity)
    }

    pub fn clear(&mut self) {
        self.identities.clear();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    max_attempts: usize,
}

impl Sampler {
    pub const DEFAULT_MAX_ATTEMPTS: usize = 250;

    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Draw a random item whose identity is not in `used`, recording it on success.
    ///
    /// Random picks are tried up to `max_attempts` times; after that the
    /// choice is made among the remaining unused items directly, so a draw
    /// never fails while an unused identity is left.
    pub fn draw<'a, T, R>(
        &self,
        pool: &[&'a T],
        used: &mut UsedSet,
        rng: &mut R,
    ) -> Result<&'a T, SampleError>
    where
        T: Identified + ?Sized,
        R: Rng + ?Sized,
    {
        if pool.is_empty() || used.len() >= pool.len() {
            return Err(SampleError::Exhausted);
        }

        for _ in 0..self.max_attempts {
            let candidate = pool[rng.gen_range(0..pool.len())];
            let identity = candidate.identity();
            if !used.contains(&identity) {
                used.insert(identity);
                return Ok(candidate);
            }
        }

        let unused: Vec<&'a T> = pool
            .iter()
            .copied()
            .filter(|item| !used.contains(&item.identity()))
            .collect();

        match unused.choose(rng) {
            Some(&item) => {
                tracing::debug!(
                    attempts = self.max_attempts,
                    pool.unused = unused.len(),
                    "Random picks exhausted, chose from remaining items"
                );
                used.insert(item.identity());
                Ok(item)
            }
            None => Err(SampleError::Exhausted),
        }
    }

    /// Number of pool items not yet drawn.
    pub fn remaining<T: Identified + ?Sized>(pool: &[&T], used: Option<&UsedSet>) -> usize {
        match used {
            Some(used) => pool
                .iter()
                .filter(|item| !used.contains(&item.identity()))
                .count(),
            None => pool.len(),
        }
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

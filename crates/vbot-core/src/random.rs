//! Injectable uniform-range sampling.
//!
//! All randomized parameters (amounts, delays, price bumps, pause slots) are
//! drawn through [`RandomSource`] so a run can be replayed from a seed or
//! driven by a script in tests.

use crate::config::UniformRange;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;

/// Uniform sampler over closed ranges.
///
/// When `min >= max` every method returns `min`.
pub trait RandomSource: Send + Sync {
    /// Sample uniformly in `[min, max]`.
    fn uniform_f64(&self, min: f64, max: f64) -> f64;

    /// Sample uniformly in `[min, max]` (both inclusive).
    fn uniform_u64(&self, min: u64, max: u64) -> u64;

    /// Sample an index in `[0, upper)`. Returns 0 when `upper == 0`.
    fn index(&self, upper: usize) -> usize {
        if upper <= 1 {
            return 0;
        }
        self.uniform_u64(0, upper as u64 - 1) as usize
    }

    /// Sample a duration from a millisecond range.
    fn duration_ms(&self, range: &UniformRange<u64>) -> Duration {
        Duration::from_millis(self.uniform_u64(range.min, range.max))
    }

    /// Sample from an `f64` range.
    fn sample_f64(&self, range: &UniformRange<f64>) -> f64 {
        self.uniform_f64(range.min, range.max)
    }

    /// Sample from a `u64` range.
    fn sample_u64(&self, range: &UniformRange<u64>) -> u64 {
        self.uniform_u64(range.min, range.max)
    }
}

// ============================================================================
// StdRandom
// ============================================================================

/// Production sampler backed by `StdRng`.
pub struct StdRandom {
    rng: Mutex<StdRng>,
}

impl StdRandom {
    /// Create a sampler seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a reproducible sampler.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for StdRandom {
    fn uniform_f64(&self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        self.rng.lock().gen_range(min..=max)
    }

    fn uniform_u64(&self, min: u64, max: u64) -> u64 {
        if min >= max {
            return min;
        }
        self.rng.lock().gen_range(min..=max)
    }
}

impl std::fmt::Debug for StdRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdRandom").finish_non_exhaustive()
    }
}

// ============================================================================
// ScriptedRandom
// ============================================================================

/// Deterministic sampler that replays a script of unit fractions.
///
/// Each call consumes the next fraction `t` in `[0, 1]` and returns
/// `min + t * (max - min)`. The script repeats once exhausted.
#[derive(Debug)]
pub struct ScriptedRandom {
    script: Mutex<VecDeque<f64>>,
}

impl ScriptedRandom {
    /// Create from a script of fractions. An empty script behaves like `[0.0]`.
    #[must_use]
    pub fn new(fractions: impl IntoIterator<Item = f64>) -> Self {
        let mut script: VecDeque<f64> = fractions
            .into_iter()
            .map(|t| t.clamp(0.0, 1.0))
            .collect();
        if script.is_empty() {
            script.push_back(0.0);
        }
        Self {
            script: Mutex::new(script),
        }
    }

    /// Always return the same fraction of every range.
    #[must_use]
    pub fn constant(fraction: f64) -> Self {
        Self::new([fraction])
    }

    fn next_fraction(&self) -> f64 {
        let mut script = self.script.lock();
        let t = script.pop_front().unwrap_or(0.0);
        script.push_back(t);
        t
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform_f64(&self, min: f64, max: f64) -> f64 {
        let t = self.next_fraction();
        if min >= max {
            return min;
        }
        min + t * (max - min)
    }

    fn uniform_u64(&self, min: u64, max: u64) -> u64 {
        let t = self.next_fraction();
        if min >= max {
            return min;
        }
        let offset = ((max - min) as f64 * t).round() as u64;
        min + offset.min(max - min)
    }
}

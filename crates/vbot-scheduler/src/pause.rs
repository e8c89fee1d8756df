//! Silent pause placement.

use std::collections::BTreeSet;
use std::time::Duration;
use vbot_core::{RandomSource, UniformRange};

/// Unit indices replaced by a long silent pause.
///
/// Computed once before the first unit and read-only afterwards. Holds
/// exactly `min(count, total_units)` distinct indices in `[0, total_units)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PauseSchedule {
    indices: BTreeSet<usize>,
    duration_ms: UniformRange<u64>,
}

impl PauseSchedule {
    /// Sample `count` distinct unit indices uniformly from `[0, total_units)`.
    ///
    /// Uses Floyd's subset sampling: one draw per index, no rejection loop.
    pub fn sample(
        count: usize,
        total_units: usize,
        duration_ms: UniformRange<u64>,
        rng: &dyn RandomSource,
    ) -> Self {
        let k = count.min(total_units);
        let mut indices = BTreeSet::new();
        for j in (total_units - k)..total_units {
            let t = rng.uniform_u64(0, j as u64) as usize;
            if !indices.insert(t) {
                indices.insert(j);
            }
        }
        Self {
            indices,
            duration_ms,
        }
    }

    /// A schedule with explicit indices.
    pub fn from_indices(
        indices: impl IntoIterator<Item = usize>,
        duration_ms: UniformRange<u64>,
    ) -> Self {
        Self {
            indices: indices.into_iter().collect(),
            duration_ms,
        }
    }

    pub fn contains(&self, unit: usize) -> bool {
        self.indices.contains(&unit)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Sample one pause length.
    pub fn sample_duration(&self, rng: &dyn RandomSource) -> Duration {
        rng.duration_ms(&self.duration_ms)
    }
}

//! Time-weighted trade sizing.
//!
//! Inside the front-load window the upper bound of the size draw is pulled
//! toward `min + 0.7 * (max - min)` as the window runs out. Once the window has
//! elapsed the draw is the plain uniform one over the configured range.

use vbot_core::{Lamports, RandomSource, UniformRange};

/// Share of the range that is always available.
const BASE_SHARE: f64 = 0.7;
/// Share scaled by the front-load factor.
const WEIGHTED_SHARE: f64 = 0.3;

/// `1 - elapsed / window`, clamped at 0.
///
/// Returns `None` outside the window, and always when `window_minutes` is 0.
pub fn front_load_factor(elapsed_minutes: f64, window_minutes: f64) -> Option<f64> {
    if window_minutes <= 0.0 || elapsed_minutes >= window_minutes {
        return None;
    }
    Some((1.0 - elapsed_minutes / window_minutes).max(0.0))
}

/// Upper bound of the size draw for a given factor.
pub fn weighted_max(range: &UniformRange<u64>, factor: f64) -> u64 {
    let span = range.max.saturating_sub(range.min) as f64;
    let share = BASE_SHARE + WEIGHTED_SHARE * factor.clamp(0.0, 1.0);
    range.min + (span * share).round() as u64
}

/// Draw a trade size for a unit starting `elapsed_minutes` into the run.
pub fn sample_trade_size(
    range: &UniformRange<u64>,
    elapsed_minutes: f64,
    window_minutes: f64,
    rng: &dyn RandomSource,
) -> Lamports {
    let upper = size_upper_bound(range, elapsed_minutes, window_minutes);
    Lamports(rng.uniform_u64(range.min, upper))
}

fn size_upper_bound(range: &UniformRange<u64>, elapsed_minutes: f64, window_minutes: f64) -> u64 {
    match front_load_factor(elapsed_minutes, window_minutes) {
        Some(factor) => weighted_max(range, factor),
        None => range.max,
    }
}

//! Synthetic depth projection.
//!
//! The feed carries trades only, so the ladder shown next to the chart is
//! made up around the last price: evenly spaced levels with random,
//! decaying quantities. It is decoration and must never be read as real
//! order-book state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::depth::{Depth, DepthLevel};

/// Number of levels generated on each side.
pub const DEPTH_LEVELS: usize = 14;

/// Level spacing as a fraction of the center price.
const STEP_RATIO: f64 = 0.002;

/// Smallest level spacing, used for very low prices.
const MIN_STEP: f64 = 0.0001;

/// Builds a synthetic ladder of [`DEPTH_LEVELS`] bids and asks around
/// `center`.
///
/// Level `i` (1-based) sits `i * step` away from the center with
/// `step = max(center * 0.002, 0.0001)`, rounded to 6 decimals. The
/// quantity is `(1 + u * 10) * (100 / i)` rounded to cents, with `u`
/// drawn from `rng`, so it shrinks with distance.
///
/// The result depends only on `center` and the state of `rng`; pass a
/// seeded generator for reproducible output.
pub fn project<R: Rng + ?Sized>(center: f64, rng: &mut R) -> Depth {
    let step = (center * STEP_RATIO).max(MIN_STEP);

    let mut level = |offset: f64, index: usize| DepthLevel {
        price: round_to(center + offset * step, 6),
        quantity: ((1.0 + rng.r#gen::<f64>() * 10.0) * (100.0 / index as f64)).round() / 100.0,
    };

    let asks = (1..=DEPTH_LEVELS).map(|i| level(i as f64, i)).collect();
    let bids = (1..=DEPTH_LEVELS).map(|i| level(-(i as f64), i)).collect();

    Depth { bids, asks }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Owns the random source used for projection and remembers the last
/// usable center price.
#[derive(Debug)]
pub struct DepthProjector {
    rng: StdRng,
    center: Option<f64>,
}

impl DepthProjector {
    /// Creates a projector seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a projector with a deterministic seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    #[must_use]
    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng, center: None }
    }

    /// Projects a ladder around `price`.
    ///
    /// A non-positive or non-finite `price` reuses the previous center; with
    /// no previous center the result is empty.
    pub fn project(&mut self, price: f64) -> Depth {
        if price.is_finite() && price > 0.0 {
            self.center = Some(price);
        }

        match self.center {
            Some(center) => project(center, &mut self.rng),
            None => Depth::default(),
        }
    }

    /// The center used by the last projection.
    pub fn center(&self) -> Option<f64> {
        self.center
    }
}

impl Default for DepthProjector {
    fn default() -> Self {
        Self::new()
    }
}

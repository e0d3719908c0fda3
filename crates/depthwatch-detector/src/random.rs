use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Uniform random capability threaded through every generation stage.
///
/// Each pipeline run borrows its own source, so independent runs never share
/// generator state. Any `rand` generator can be used directly.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform draw in `[low, high)`.
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_unit() * (high - low)
    }

    /// True with the given probability; consumes exactly one draw.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }
}

impl<R: RngCore> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.random::<f64>()
    }
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn entropy_rng() -> StdRng {
    StdRng::from_os_rng()
}

/// Replays a fixed list of draws, wrapping around at the end.
///
/// Useful to pin a particular branch of the generator; an empty list always
/// yields `0.0`.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    values: Vec<f64>,
    cursor: usize,
}

impl ReplaySource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values = values
            .into()
            .into_iter()
            .map(|value| value.clamp(0.0, MAX_UNIT))
            .collect();
        Self { values, cursor: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of draws consumed so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

// Largest f64 strictly below 1.0.
const MAX_UNIT: f64 = 1.0 - f64::EPSILON / 2.0;

impl RandomSource for ReplaySource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

//! Injectable uniform randomness for simulation code.
//!
//! Simulation systems never reach for a global generator; they draw from a
//! `RandomSource` handed to them so that a seed or a scripted sequence fully
//! determines the outcome of a run.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed used when the host does not supply one.
pub const DEFAULT_SEED: u64 = 42;

/// Largest `f64` strictly below 1.0.
const MAX_UNIT_FLOAT: f64 = 1.0 - f64::EPSILON / 2.0;

pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_float(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_float(&mut self) -> f64 {
        (**self).next_float()
    }
}

/// Deterministic, platform-independent generator.
#[derive(Debug, Clone)]
pub struct SeededRandom(ChaCha8Rng);

impl Default for SeededRandom {
    fn default() -> Self {
        Self::from_seed_u64(DEFAULT_SEED)
    }
}

impl SeededRandom {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn next_float(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed sequence of draws, wrapping around at the end.
///
/// Values are clamped into `[0, 1)`. An empty script always yields `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    cursor: usize,
    draws: u64,
}

impl ScriptedRandom {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values = values
            .into()
            .into_iter()
            .map(clamp_unit)
            .collect::<Vec<_>>();
        Self {
            values,
            cursor: 0,
            draws: 0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of values handed out so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl RandomSource for ScriptedRandom {
    fn next_float(&mut self) -> f64 {
        self.draws = self.draws.saturating_add(1);
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, MAX_UNIT_FLOAT)
}

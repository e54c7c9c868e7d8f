//! Cumulative-weight tables for weighted sampling.
//!
//! A table is a list of `(value, cumulative_weight)` pairs with cumulative
//! weights increasing up to `1.0`. Sampling takes one uniform draw in
//! `[0, 1)` and returns the first value whose cumulative weight exceeds it,
//! so the lookup can be tested without a random source.

use rand::Rng;

/// A weighted distribution over a fixed set of values.
#[derive(Debug, Clone, Copy)]
pub struct CumulativeTable<T: 'static> {
    entries: &'static [(T, f64)],
}

impl<T: 'static> CumulativeTable<T> {
    /// Build a table from `(value, cumulative_weight)` pairs.
    ///
    /// Evaluated at compile time when used in a `const` item, so an empty
    /// table fails the build.
    pub const fn new(entries: &'static [(T, f64)]) -> Self {
        assert!(!entries.is_empty(), "distribution table must not be empty");
        Self { entries }
    }

    /// Select the value for a uniform draw `u` in `[0, 1)`.
    ///
    /// Draws at or above the last cumulative weight (floating point slack)
    /// fall through to the last entry.
    pub fn pick(&self, u: f64) -> &T {
        self.entries
            .iter()
            .find(|(_, cumulative)| u < *cumulative)
            .map(|(value, _)| value)
            .unwrap_or(&self.entries[self.entries.len() - 1].0)
    }

    /// Draw a value using `rng`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> &T {
        self.pick(rng.gen::<f64>())
    }

    /// Individual (non-cumulative) weight of each entry.
    pub fn weights(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        let mut previous = 0.0;
        self.entries.iter().map(move |(value, cumulative)| {
            let weight = cumulative - previous;
            previous = *cumulative;
            (value, weight)
        })
    }

    pub fn entries(&self) -> &'static [(T, f64)] {
        self.entries
    }
}

/// Uniformly choose one element of a non-empty slice.
pub fn choose_uniform<'a, T, R: Rng>(rng: &mut R, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

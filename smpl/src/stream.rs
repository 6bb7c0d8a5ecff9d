//! Reproducible pseudo-random streams.
//!
//! The generator is the multiplicative congruential generator used by SMPL:
//! `x' = 16807 * x mod (2^31 - 1)`. Each of the 15 streams keeps its own state, so switching
//! between streams never disturbs the sequence of another one.

use std::convert::TryFrom;

use crate::{Error, Result};

/// Number of independent streams.
pub const STREAM_COUNT: usize = 15;

/// Initial states of streams 1 to 15.
pub const DEFAULT_SEEDS: [u64; STREAM_COUNT] = [
    1_973_272_912,
    747_177_549,
    20_464_843,
    640_830_765,
    1_098_742_207,
    78_126_602,
    84_743_774,
    831_312_807,
    124_667_236,
    1_172_177_002,
    1_124_933_064,
    1_223_960_546,
    1_878_892_440,
    1_449_793_615,
    553_303_732,
];

/// Multiplier, `7^5`.
const MULTIPLIER: u64 = 16_807;

/// Modulus, `2^31 - 1`.
const MODULUS: u64 = 2_147_483_647;

/// Maps a state to `(0, 1)`. Kept at SMPL's precision so that sequences match bit for bit.
const SCALE: f64 = 4.656_612_875e-10;

/// A set of 15 independent random streams with one of them selected as active.
///
/// Stream 1 is active until [`select`](#method.select) is called.
///
/// # Examples
///
/// ```
/// # use smpl::RandomStreams;
/// # fn main() -> smpl::Result<()> {
/// let mut first = RandomStreams::default();
/// let mut second = RandomStreams::default();
/// first.select(5)?;
/// second.select(5)?;
/// for _ in 0..100 {
///     assert_eq!(first.uniform().to_bits(), second.uniform().to_bits());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomStreams {
    states: [u64; STREAM_COUNT],
    active: usize,
}

impl Default for RandomStreams {
    fn default() -> Self {
        Self {
            states: DEFAULT_SEEDS,
            active: 0,
        }
    }
}

impl RandomStreams {
    /// Constructs streams from a custom seed table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if any seed is 0 or not below `2^31 - 1`, since
    /// such a state would either stay at 0 forever or fall outside of the generator's cycle.
    pub fn with_seeds(seeds: [u64; STREAM_COUNT]) -> Result<Self> {
        if let Some(&seed) = seeds.iter().find(|&&s| s == 0 || s >= MODULUS) {
            return Err(Error::InvalidParameter {
                name: "seed",
                value: seed as f64,
            });
        }
        Ok(Self {
            states: seeds,
            active: 0,
        })
    }

    /// Selects the stream used by subsequent draws. Streams are numbered from 1 to 15.
    /// The state of the selected stream is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStream`] if `stream` is outside of `1..=15`.
    pub fn select(&mut self, stream: usize) -> Result<()> {
        if !(1..=STREAM_COUNT).contains(&stream) {
            return Err(Error::InvalidStream(stream));
        }
        self.active = stream - 1;
        Ok(())
    }

    /// Returns the number of the active stream.
    #[must_use]
    pub fn stream(&self) -> usize {
        self.active + 1
    }

    /// Returns the current state of the given stream, or `None` if the index is invalid.
    #[must_use]
    pub fn state(&self, stream: usize) -> Option<u64> {
        stream
            .checked_sub(1)
            .and_then(|idx| self.states.get(idx))
            .copied()
    }

    /// Advances the active stream and returns a value uniformly distributed in `(0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        let state = &mut self.states[self.active];
        *state = *state * MULTIPLIER % MODULUS;
        *state as f64 * SCALE
    }

    /// Draws from the exponential distribution with the given mean: `-mean * ln(u)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `mean` is not a positive finite number.
    /// In that case, the stream is not advanced.
    pub fn exponential(&mut self, mean: f64) -> Result<f64> {
        if mean <= 0.0 || !mean.is_finite() {
            return Err(Error::InvalidParameter {
                name: "mean",
                value: mean,
            });
        }
        Ok(-mean * self.uniform().ln())
    }

    /// Draws a value uniformly distributed in `(low, high)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] unless `low < high` and both are finite.
    pub fn uniform_between(&mut self, low: f64, high: f64) -> Result<f64> {
        if !low.is_finite() {
            return Err(Error::InvalidParameter {
                name: "low",
                value: low,
            });
        }
        if !high.is_finite() || high <= low {
            return Err(Error::InvalidParameter {
                name: "high",
                value: high,
            });
        }
        // Weighted form keeps the result finite even when `high - low` overflows.
        let u = self.uniform();
        Ok(low * (1.0 - u) + high * u)
    }

    /// Draws an integer uniformly distributed in `low..=high`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `high < low`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn random_int(&mut self, low: i64, high: i64) -> Result<i64> {
        if high < low {
            return Err(Error::InvalidParameter {
                name: "high",
                value: high as f64,
            });
        }
        let (low, high) = (i128::from(low), i128::from(high));
        let span = (high - low + 1) as f64;
        // Rounding of a wide span may push the offset up to the span itself.
        let value = (low + (span * self.uniform()) as i128).min(high);
        Ok(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

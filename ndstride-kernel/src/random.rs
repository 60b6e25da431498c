//! Explicit, serializable random generator.
//!
//! A [`Generator`] is a plain value owned by the caller. Every draw seeds a
//! fresh [`StdRng`] from `(seed, counter)` and then advances the counter, so
//! the whole generator state is those two numbers and round-trips through a
//! 16-byte [`GeneratorState`].

use log::trace;
use ndstride_view::{from_vec, NdArray, NdError, Result, Storable};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Opaque saved state of a [`Generator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorState([u8; GeneratorState::LEN]);

impl GeneratorState {
    /// Serialized length in bytes.
    pub const LEN: usize = 16;

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Restore from bytes produced by [`GeneratorState::as_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; Self::LEN] = bytes
            .try_into()
            .map_err(|_| NdError::InvalidGeneratorState(bytes.len()))?;
        Ok(Self(raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    seed: u64,
    counter: u64,
}

/// SplitMix64 finalizer over the seed and draw counter.
#[inline]
fn mix(seed: u64, counter: u64) -> u64 {
    let mut z = seed ^ counter.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl Generator {
    pub fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    pub fn state(&self) -> GeneratorState {
        let mut raw = [0u8; GeneratorState::LEN];
        raw[..8].copy_from_slice(&self.seed.to_le_bytes());
        raw[8..].copy_from_slice(&self.counter.to_le_bytes());
        GeneratorState(raw)
    }

    pub fn from_state(state: &GeneratorState) -> Self {
        let mut seed = [0u8; 8];
        let mut counter = [0u8; 8];
        seed.copy_from_slice(&state.0[..8]);
        counter.copy_from_slice(&state.0[8..]);
        Self {
            seed: u64::from_le_bytes(seed),
            counter: u64::from_le_bytes(counter),
        }
    }

    /// Rng for the next draw; advances the generator.
    fn next_rng(&mut self) -> StdRng {
        let rng = StdRng::seed_from_u64(mix(self.seed, self.counter));
        trace!("generator draw seed={} counter={}", self.seed, self.counter);
        self.counter = self.counter.wrapping_add(1);
        rng
    }

    fn draw<T, F>(&mut self, dims: &[usize], mut sample: F) -> Result<NdArray>
    where
        T: Storable,
        F: FnMut(&mut StdRng) -> T,
    {
        let mut rng = self.next_rng();
        let size: usize = dims.iter().product();
        let data: Vec<T> = (0..size).map(|_| sample(&mut rng)).collect();
        from_vec(data, dims)
    }

    /// Uniform `f64` samples in `[0, 1)`.
    pub fn random(&mut self, dims: &[usize]) -> Result<NdArray> {
        self.draw(dims, |rng| rng.gen::<f64>())
    }

    /// Samples from the standard normal distribution.
    pub fn standard_normal(&mut self, dims: &[usize]) -> Result<NdArray> {
        self.draw(dims, |rng| rng.sample::<f64, _>(StandardNormal))
    }

    /// Normal samples with mean `loc` and standard deviation `scale`.
    pub fn normal(&mut self, loc: f64, scale: f64, dims: &[usize]) -> Result<NdArray> {
        self.draw(dims, |rng| loc + scale * rng.sample::<f64, _>(StandardNormal))
    }

    /// Uniform `f64` samples in `[low, high)`, computed as
    /// `low + (high - low) * u`.
    pub fn uniform(&mut self, low: f64, high: f64, dims: &[usize]) -> Result<NdArray> {
        self.draw(dims, |rng| low + (high - low) * rng.gen::<f64>())
    }

    /// Uniform `i64` samples in `[low, high)`.
    pub fn integers(&mut self, low: i64, high: i64, dims: &[usize]) -> Result<NdArray> {
        if low >= high {
            return Err(NdError::EmptyRange { low, high });
        }
        self.draw(dims, |rng| rng.gen_range(low..high))
    }

    /// A random ordering of `0..n` as `i64`.
    pub fn permutation(&mut self, n: usize) -> Result<NdArray> {
        let mut rng = self.next_rng();
        let mut data: Vec<i64> = (0..n as i64).collect();
        data.shuffle(&mut rng);
        from_vec(data, &[n])
    }
}

//! Seeded draws for synthetic runs.
//!
//! A synthetic run is a pure function of its seed. Each aspect of the run
//! (identifiers, fuel masses, discharge burn-up, reactor power) draws from
//! its own PCG stream, so drawing more from one aspect leaves the others
//! untouched.

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use uuid::Uuid;

/// What a stream is drawn for. The discriminant is mixed into the seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Stream {
    Identity = 0,
    Fuel = 1,
    Discharge = 2,
    Power = 3,
}

pub struct SynthRng(Pcg64Mcg);

impl SynthRng {
    pub fn new(seed: u64, stream: Stream) -> Self {
        let mixed = seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self(Pcg64Mcg::seed_from_u64(mixed))
    }

    /// Uniform in `[0, n)`; 0 when `n == 0`.
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.0.gen_range(0..n)
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.0.gen::<f64>() < p
    }

    /// Uniform in `[lo, hi)`.
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.0.gen::<f64>()
    }

    /// Run identifier with version 4 layout.
    pub fn uuid(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.0.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

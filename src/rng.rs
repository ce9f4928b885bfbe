use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Single seeded PRNG handle threaded through the scheduler and into every
/// component that needs randomness (link-layer heralding, swap success,
/// mux selection). There are no hidden/global RNGs anywhere in the core —
/// every call site that needs entropy takes a `&mut SimRng`.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: StdRng,
}

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        SimRng {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform sample in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.inner.random::<f64>()
    }

    /// Bernoulli trial with success probability `p` (clamped to `[0, 1]`).
    pub fn bernoulli(&mut self, p: f64) -> bool {
        self.uniform() < p.clamp(0.0, 1.0)
    }
}

//! Deterministic random number generation.
//!
//! RULE: Nothing in the engine may call any platform RNG.
//! All randomness flows through StreamRng instances derived from the single
//! master seed recorded on the session.
//!
//! Each zone gets its own RNG stream, seeded deterministically from
//! (master_seed XOR zone_index). This means:
//!   - Registering a new zone never changes existing zones' streams.
//!   - Each zone's stream is fully reproducible in isolation.
//!
//! The only consumer today is the randomized capture delay, but the rule
//! stands for anything added later.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single zone.
pub struct StreamRng {
    pub name: String,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// Create a zone RNG from the master seed and the zone's stable
    /// registration index. The index must never change once assigned.
    pub fn new(master_seed: u64, zone_index: u64) -> Self {
        let derived_seed = master_seed ^ (zone_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: String::new(),
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f32(&mut self) -> f32 {
        use rand::RngCore;
        let bits = self.inner.next_u32();
        (bits >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    /// Uniform draw from [min, max]. Degenerate ranges collapse to min.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + self.next_f32() * (max - min)
    }
}

/// All zone RNG streams for a single session, indexed by registration order.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_zone(&self, zone_index: u64, name: &str) -> StreamRng {
        StreamRng::new(self.master_seed, zone_index).with_name(name)
    }
}

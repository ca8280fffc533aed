//! Stochastic mechanics: uniform draws, categorical sampling and per-run seeding.
//! Every helper takes the generator explicitly, so each run can own its own
//! `WyRand` and runs never share random state.
use bevy_prng::WyRand;
use rand_core::{RngCore, SeedableRng};

/// Uniform [0, 1) from the top 53 bits of one `u64`.
#[inline]
pub fn uniform01<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    ((rng.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Pick an index with probability `probs[i]`.
///
/// `probs` must be non-negative and sum to 1 (up to rounding). Rounding slack
/// at the top of the cumulative sum falls to the last index with positive mass,
/// never to a zero-probability color.
pub fn categorical<R: RngCore + ?Sized>(rng: &mut R, probs: &[f64]) -> usize {
    let u = uniform01(rng);
    let mut acc = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        acc += p;
        if p > 0.0 && u < acc {
            return i;
        }
    }
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}

/// SplitMix64 finalizer; decorrelates neighbouring seeds.
#[inline]
pub fn mix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Independent generator for run `run_id` of a batch seeded with `seed`.
pub fn run_rng(seed: u64, run_id: usize) -> WyRand {
    let s = mix64(seed.wrapping_add(run_id as u64));
    WyRand::from_seed(s.to_le_bytes())
}

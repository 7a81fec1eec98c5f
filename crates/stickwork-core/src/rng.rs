//! Deterministic RNG using PCG32 with BLAKE3 stream derivation.
//!
//! Every random decision in the core draws from a stream derived purely from
//! `(seed, stream_key)`. There is no shared generator, so operators can run
//! in any order (or in parallel) and still reproduce the same output.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Creates a PCG32 RNG from a 32-bit seed.
///
/// The 32-bit seed is expanded to 64 bits by duplicating the value in both
/// halves.
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// Derives an independent seed for a named stream.
///
/// Hashes the little-endian seed bytes followed by the UTF-8 key and keeps
/// the first four bytes of the digest.
pub fn derive_stream_seed(seed: u32, stream_key: &str) -> u32 {
    let mut input = Vec::with_capacity(4 + stream_key.len());
    input.extend_from_slice(&seed.to_le_bytes());
    input.extend_from_slice(stream_key.as_bytes());

    let hash = blake3::hash(&input);
    let bytes = hash.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Creates the RNG for a named stream.
pub fn create_stream_rng(seed: u32, stream_key: &str) -> Pcg32 {
    create_rng(derive_stream_seed(seed, stream_key))
}

/// Builds the stream key for one operator decision within a bar.
pub fn stream_key(bar: u32, operator_id: &str, index: u32) -> String {
    format!("bar{}/{}/{}", bar, operator_id, index)
}

/// Draws an integer in `[low, high]`.
pub fn range_inclusive(rng: &mut Pcg32, low: u32, high: u32) -> u32 {
    if high <= low {
        return low;
    }
    rng.gen_range(low..=high)
}

/// Picks `count` distinct indices from `0..len` in ascending order.
///
/// Deterministic partial Fisher-Yates over the index range.
pub fn pick_sorted_indices(rng: &mut Pcg32, len: usize, count: usize) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..len).collect();
    let count = count.min(len);
    for i in 0..count {
        let j = rng.gen_range(i..len);
        pool.swap(i, j);
    }
    let mut picked = pool[..count].to_vec();
    picked.sort_unstable();
    picked
}

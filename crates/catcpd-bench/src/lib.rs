// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use catcpd_core::{CountMatrix, CpdError};

/// Deterministic LCG shared by the benchmarks.
pub fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

/// One-hot labels drawn from a skewed distribution that rotates every
/// `regime_len` samples.
pub fn regime_labels(n: usize, d: usize, regime_len: usize, seed: u64) -> Vec<usize> {
    let mut state = seed;
    (0..n)
        .map(|t| {
            let dominant = (t / regime_len.max(1)) % d;
            let draw = lcg_next(&mut state) >> 33;
            if draw % 4 == 0 {
                (draw as usize / 4) % d
            } else {
                dominant
            }
        })
        .collect()
}

/// One-hot count matrix over [`regime_labels`].
pub fn regime_matrix(
    n: usize,
    d: usize,
    regime_len: usize,
    seed: u64,
) -> Result<CountMatrix, CpdError> {
    CountMatrix::from_labels(&regime_labels(n, d, regime_len, seed), d)
}

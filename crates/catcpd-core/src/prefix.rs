// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{CountMatrixView, CpdError};

/// Cumulative count table with `n + 1` rows of `d` counts.
///
/// Row 0 is all zeros and row `i` is the sum of signal rows `[0, i)`, so the
/// counts of any segment `[a, b)` are `row(b) - row(a)`. Every column is
/// non-decreasing. `u64` cells cannot overflow for any `u32` signal whose
/// length fits in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CumulativeCounts {
    table: Vec<u64>,
    n: usize,
    d: usize,
}

impl CumulativeCounts {
    /// Bytes needed for an `n × d` signal, or `None` on overflow.
    pub fn worst_case_bytes(n: usize, d: usize) -> Option<usize> {
        n.checked_add(1)?
            .checked_mul(d)?
            .checked_mul(std::mem::size_of::<u64>())
    }

    /// Builds the table in O(n·d).
    ///
    /// Allocation failure is reported as `CpdError::ResourceLimit` rather than
    /// aborting the process.
    pub fn build(x: &CountMatrixView<'_>) -> Result<Self, CpdError> {
        let overflow = || {
            CpdError::resource_limit(format!(
                "cumulative count table size overflow for n={}, d={}",
                x.n, x.d
            ))
        };
        let len = x
            .n
            .checked_add(1)
            .and_then(|rows| rows.checked_mul(x.d))
            .ok_or_else(overflow)?;

        let mut table: Vec<u64> = Vec::new();
        table.try_reserve_exact(len).map_err(|err| {
            CpdError::resource_limit(format!(
                "failed to allocate cumulative count table of {len} cells: {err}"
            ))
        })?;
        table.resize(x.d, 0);

        for t in 0..x.n {
            let previous = t * x.d;
            for k in 0..x.d {
                let next = table[previous + k]
                    .checked_add(u64::from(x.get(t, k)))
                    .ok_or_else(|| {
                        CpdError::resource_limit(format!(
                            "cumulative count overflow at t={t}, k={k}"
                        ))
                    })?;
                table.push(next);
            }
        }

        debug_assert_eq!(table.len(), len);
        Ok(Self { table, n: x.n, d: x.d })
    }

    /// Number of signal rows (the table has `n + 1`).
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn d(&self) -> usize {
        self.d
    }

    /// Cumulative counts of rows `[0, i)`.
    pub fn row(&self, i: usize) -> &[u64] {
        assert!(i <= self.n, "prefix row out of bounds: i={i}, n={}", self.n);
        &self.table[i * self.d..(i + 1) * self.d]
    }

    /// Writes the counts of `[start, end)` into `out`.
    pub fn segment_counts(&self, start: usize, end: usize, out: &mut [u64]) {
        self.check_segment(start, end, out.len());
        let (lo, hi) = (self.row(start), self.row(end));
        for ((slot, &h), &l) in out.iter_mut().zip(hi).zip(lo) {
            *slot = h - l;
        }
    }

    /// Same as [`Self::segment_counts`], converted to `f64`.
    pub fn segment_counts_f64(&self, start: usize, end: usize, out: &mut [f64]) {
        self.check_segment(start, end, out.len());
        let (lo, hi) = (self.row(start), self.row(end));
        for ((slot, &h), &l) in out.iter_mut().zip(hi).zip(lo) {
            *slot = (h - l) as f64;
        }
    }

    fn check_segment(&self, start: usize, end: usize, out_len: usize) {
        assert!(
            start <= end && end <= self.n,
            "segment out of bounds: start={start}, end={end}, n={}",
            self.n
        );
        assert_eq!(
            out_len, self.d,
            "segment buffer length {out_len} does not match d={}",
            self.d
        );
    }
}

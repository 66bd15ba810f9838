// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::model::CostModel;
use catcpd_core::{CountMatrixView, CpdError, CumulativeCounts, ExecutionContext};

/// Largest grand total for which every segment count converts to `f64` exactly.
const MAX_EXACT_TOTAL: u64 = 1 << 53;

/// `x·ln(x)` extended by continuity with `xlogx(0) = 0`.
///
/// Non-positive inputs return 0 so `ln(0)` is never evaluated.
pub fn xlogx(x: f64) -> f64 {
    if x > 0.0 { x * x.ln() } else { 0.0 }
}

/// Multinomial cost of a segment with per-symbol `counts` over `len` samples:
/// `-len · Σ_k xlogx(counts[k] / len)`.
///
/// `len` need not be an integer; the Lagrangian bound in the AFP search
/// evaluates blended segments of fractional length.
pub fn cost_from_counts(counts: &[f64], len: f64) -> f64 {
    -counts
        .iter()
        .filter(|&&v| v > 0.0)
        .map(|&v| v * (v / len).ln())
        .sum::<f64>()
}

/// Negative maximized multinomial log-likelihood of a segment.
///
/// Segment conventions use half-open intervals: `[start, end)`. The cost is
/// zero for a pure segment of one-hot rows and super-additive in general, so
/// splitting a segment never increases the unpenalized cost.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CostMultinomial;

impl CostMultinomial {
    pub const fn new() -> Self {
        Self
    }
}

/// Prefix-count cache for O(d) multinomial segment-cost queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultinomialCache {
    prefix: CumulativeCounts,
}

impl MultinomialCache {
    pub fn n(&self) -> usize {
        self.prefix.n()
    }

    pub fn d(&self) -> usize {
        self.prefix.d()
    }

    pub fn prefix(&self) -> &CumulativeCounts {
        &self.prefix
    }

    /// Writes the counts of `[start, end)` as `f64` into `out`.
    pub fn segment_counts(&self, start: usize, end: usize, out: &mut [f64]) {
        self.prefix.segment_counts_f64(start, end, out);
    }
}

impl CostModel for CostMultinomial {
    type Cache = MultinomialCache;

    fn name(&self) -> &'static str {
        "multinomial"
    }

    fn validate(&self, x: &CountMatrixView<'_>) -> Result<(), CpdError> {
        let mut total = 0u64;
        for t in 0..x.n {
            total = total.saturating_add(x.row_total(t));
            if total > MAX_EXACT_TOTAL {
                return Err(CpdError::invalid_input(format!(
                    "CostMultinomial requires a total count <= 2^53; exceeded at t={t}"
                )));
            }
        }
        Ok(())
    }

    fn precompute(
        &self,
        x: &CountMatrixView<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Self::Cache, CpdError> {
        let required_bytes = self.worst_case_cache_bytes(x);
        if required_bytes == usize::MAX {
            return Err(CpdError::resource_limit(format!(
                "cache size overflow while planning MultinomialCache for n={}, d={}",
                x.n, x.d
            )));
        }
        ctx.check_memory_budget("CostMultinomial cache", required_bytes)?;

        Ok(MultinomialCache {
            prefix: CumulativeCounts::build(x)?,
        })
    }

    fn worst_case_cache_bytes(&self, x: &CountMatrixView<'_>) -> usize {
        CumulativeCounts::worst_case_bytes(x.n, x.d).unwrap_or(usize::MAX)
    }

    fn segment_cost(&self, cache: &Self::Cache, start: usize, end: usize) -> f64 {
        assert!(
            start < end,
            "segment_cost requires start < end; got start={start}, end={end}"
        );
        assert!(
            end <= cache.n(),
            "segment_cost end out of bounds: end={end}, n={}",
            cache.n()
        );

        let len = (end - start) as f64;
        let lo = cache.prefix.row(start);
        let hi = cache.prefix.row(end);

        let mut total = 0.0;
        for (&h, &l) in hi.iter().zip(lo) {
            let count = h - l;
            if count == 0 {
                continue;
            }
            let count = count as f64;
            total += count * (count / len).ln();
        }
        -total
    }
}

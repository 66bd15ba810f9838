// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use catcpd_core::{CountMatrixView, CpdError, ExecutionContext};

/// Segment cost contract consumed by the offline searches.
///
/// Segments are half-open `[start, end)` over the sample axis.
pub trait CostModel {
    type Cache;

    fn name(&self) -> &'static str;

    /// Rejects signals the model cannot score.
    fn validate(&self, x: &CountMatrixView<'_>) -> Result<(), CpdError>;

    /// Builds the query cache, honoring `ctx.constraints.memory_budget_bytes`.
    fn precompute(
        &self,
        x: &CountMatrixView<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Self::Cache, CpdError>;

    /// Upper bound on cache size in bytes; `usize::MAX` on overflow.
    fn worst_case_cache_bytes(&self, x: &CountMatrixView<'_>) -> usize;

    /// Cost of `[start, end)`. Panics when `start >= end` or `end > n`.
    fn segment_cost(&self, cache: &Self::Cache, start: usize, end: usize) -> f64;
}

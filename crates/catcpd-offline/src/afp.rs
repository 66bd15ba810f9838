// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::sweep::{DEFAULT_CANCEL_CHECK_EVERY, PruningRule, RunSpec, run_detector, validate_penalty};
use catcpd_core::{
    ChangePointPath, Constraints, CountMatrixView, CpdError, ExecutionContext,
    OfflineChangePointResult, OfflineDetector,
};
use catcpd_costs::MultinomialCache;

/// Fraction of the largest admissible multiplier used by the dominance test.
pub const LAMBDA_INTERIOR_FRACTION: f64 = 0.75;

/// Configuration for [`Afp`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AfpConfig {
    pub penalty: f64,
    pub cancel_check_every: usize,
}

impl Default for AfpConfig {
    fn default() -> Self {
        Self {
            penalty: 1.0,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        }
    }
}

impl AfpConfig {
    pub fn validate(&self) -> Result<(), CpdError> {
        validate_penalty("AfpConfig", self.penalty)
    }
}

/// PELT with an additional Lagrangian-relaxation pruning test.
///
/// A candidate `tau` that survives the PELT test is compared against the
/// candidate `c` scanned just before it. For a multiplier `0 <= lambda`, the
/// dual bound
///
/// ```text
/// SoC(tau) + lambda·(SoC(tau) - SoC(c)) + cost(w, L_w) + penalty
/// w   = counts[tau, t) - lambda·counts[c, tau)
/// L_w = (t - tau) - lambda·(tau - c)
/// ```
///
/// lower-bounds how much better `tau` can ever be than `c`; when it exceeds
/// `SoC(t) + penalty`, `tau` is dominated at every later end index and is
/// discarded. Results are identical to [`crate::Pelt`].
#[derive(Debug)]
pub struct Afp {
    config: AfpConfig,
}

impl Afp {
    pub fn new(config: AfpConfig) -> Result<Self, CpdError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AfpConfig {
        &self.config
    }
}

impl OfflineDetector for Afp {
    fn detect(
        &self,
        x: &CountMatrixView<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<OfflineChangePointResult, CpdError> {
        self.config.validate()?;
        run_detector(
            x,
            ctx,
            RunSpec {
                rule: PruningRule::Afp,
                penalty: self.config.penalty,
                cancel_check_every: self.config.cancel_check_every,
            },
        )
    }
}

/// Optimal segmentation path of `signal` under `penalty` using AFP pruning.
pub fn search_afp(signal: &CountMatrixView<'_>, penalty: f64) -> Result<ChangePointPath, CpdError> {
    let detector = Afp::new(AfpConfig {
        penalty,
        ..AfpConfig::default()
    })?;
    let constraints = Constraints::default();
    let ctx = ExecutionContext::new(&constraints);
    Ok(detector.detect(signal, &ctx)?.path)
}

/// Reusable per-run buffers for the dominance test.
#[derive(Clone, Debug)]
pub(crate) struct LagrangianScratch {
    last: Vec<f64>,
    compare: Vec<f64>,
    proba: Vec<f64>,
}

impl LagrangianScratch {
    pub(crate) fn new(d: usize) -> Self {
        Self {
            last: vec![0.0; d],
            compare: vec![0.0; d],
            proba: vec![0.0; d],
        }
    }
}

/// Largest `lambda` keeping `last - lambda·compare` nonnegative, i.e.
/// `min_k last[k] / compare[k]` over `compare[k] > 0`.
///
/// `None` when no symbol occurs in `compare`, or when a symbol occurs in
/// `compare` but not in `last` (the bound would be zero and the test reduces
/// to the PELT test).
pub fn lambda_upper_bound(last: &[f64], compare: &[f64]) -> Option<f64> {
    let mut bound: Option<f64> = None;
    for (&l, &c) in last.iter().zip(compare) {
        if c <= 0.0 {
            continue;
        }
        if l <= 0.0 {
            return None;
        }
        let ratio = l / c;
        bound = Some(bound.map_or(ratio, |current| current.min(ratio)));
    }
    bound
}

/// Inputs of one dominance test.
#[derive(Clone, Copy, Debug)]
pub struct LagrangianInputs<'a> {
    /// Counts of `[last_cp, end)`.
    pub last: &'a [f64],
    /// Counts of `[compare_cp, last_cp)`.
    pub compare: &'a [f64],
    pub last_len: f64,
    pub compare_len: f64,
    pub soc_last: f64,
    pub soc_compare: f64,
    pub penalty: f64,
}

/// Evaluates the dual bound; `None` when the test does not apply.
///
/// `proba` is scratch space of the same length as `inputs.last`.
pub fn lagrangian_bound(inputs: &LagrangianInputs<'_>, proba: &mut [f64]) -> Option<f64> {
    let lambda = LAMBDA_INTERIOR_FRACTION * lambda_upper_bound(inputs.last, inputs.compare)?;

    let mut proba_sum = 0.0;
    for ((slot, &l), &c) in proba.iter_mut().zip(inputs.last).zip(inputs.compare) {
        *slot = l - lambda * c;
        proba_sum += *slot;
    }
    if proba_sum <= 0.0 {
        return None;
    }
    let blend_len = inputs.last_len - lambda * inputs.compare_len;
    if blend_len <= 0.0 {
        return None;
    }
    for slot in proba.iter_mut() {
        *slot /= proba_sum;
    }

    let mut last_term = 0.0;
    let mut compare_term = 0.0;
    for ((&p, &l), &c) in proba.iter().zip(inputs.last).zip(inputs.compare) {
        if l > 0.0 {
            last_term += l * p.ln();
        }
        if c > 0.0 {
            compare_term += c * p.ln();
        }
    }
    // zero when proba_sum == blend_len, as for one-hot rows
    let length_correction = -proba_sum * (proba_sum / blend_len).ln();

    Some(
        inputs.soc_last + inputs.penalty - last_term
            + lambda * (inputs.soc_last - inputs.soc_compare + compare_term)
            + length_correction,
    )
}

/// True when `last_cp` is dominated by `compare_cp` for every end index
/// from `end` on.
pub(crate) fn lagrangian_dominated(
    cache: &MultinomialCache,
    compare_cp: usize,
    last_cp: usize,
    end: usize,
    sum_of_costs: &[f64],
    penalty: f64,
    scratch: &mut LagrangianScratch,
) -> Result<bool, CpdError> {
    cache.segment_counts(last_cp, end, &mut scratch.last);
    cache.segment_counts(compare_cp, last_cp, &mut scratch.compare);

    let inputs = LagrangianInputs {
        last: &scratch.last,
        compare: &scratch.compare,
        last_len: (end - last_cp) as f64,
        compare_len: (last_cp - compare_cp) as f64,
        soc_last: sum_of_costs[last_cp],
        soc_compare: sum_of_costs[compare_cp],
        penalty,
    };
    let Some(bound) = lagrangian_bound(&inputs, &mut scratch.proba) else {
        return Ok(false);
    };
    if !bound.is_finite() {
        return Err(CpdError::numerical_issue(format!(
            "non-finite Lagrangian bound at t={end}, tau={last_cp}, compare={compare_cp}: {bound}"
        )));
    }
    Ok(bound > sum_of_costs[end] + penalty)
}

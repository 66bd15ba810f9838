// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::sweep::{DEFAULT_CANCEL_CHECK_EVERY, PruningRule, RunSpec, run_detector, validate_penalty};
use catcpd_core::{
    ChangePointPath, Constraints, CountMatrixView, CpdError, ExecutionContext,
    OfflineChangePointResult, OfflineDetector,
};

/// Configuration for [`Pelt`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PeltConfig {
    pub penalty: f64,
    pub cancel_check_every: usize,
}

impl Default for PeltConfig {
    fn default() -> Self {
        Self {
            penalty: 1.0,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        }
    }
}

impl PeltConfig {
    pub fn validate(&self) -> Result<(), CpdError> {
        validate_penalty("PeltConfig", self.penalty)
    }
}

/// Pruned Exact Linear Time offline detector.
///
/// After each step, candidates with `SoC(tau) + cost([tau, t)) > SoC(t)` are
/// discarded: by super-additivity of the multinomial cost they can never
/// start the last segment of a later optimum.
#[derive(Debug)]
pub struct Pelt {
    config: PeltConfig,
}

impl Pelt {
    pub fn new(config: PeltConfig) -> Result<Self, CpdError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PeltConfig {
        &self.config
    }
}

impl OfflineDetector for Pelt {
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
                rule: PruningRule::Pelt,
                penalty: self.config.penalty,
                cancel_check_every: self.config.cancel_check_every,
            },
        )
    }
}

/// Optimal segmentation path of `signal` under `penalty` using PELT pruning.
pub fn search_pelt(
    signal: &CountMatrixView<'_>,
    penalty: f64,
) -> Result<ChangePointPath, CpdError> {
    let detector = Pelt::new(PeltConfig {
        penalty,
        ..PeltConfig::default()
    })?;
    let constraints = Constraints::default();
    let ctx = ExecutionContext::new(&constraints);
    Ok(detector.detect(signal, &ctx)?.path)
}

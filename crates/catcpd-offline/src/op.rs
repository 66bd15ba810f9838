// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::sweep::{DEFAULT_CANCEL_CHECK_EVERY, PruningRule, RunSpec, run_detector, validate_penalty};
use catcpd_core::{
    CountMatrixView, CpdError, ExecutionContext, OfflineChangePointResult, OfflineDetector,
};

/// Configuration for [`OptimalPartitioning`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct OptimalPartitioningConfig {
    pub penalty: f64,
    pub cancel_check_every: usize,
}

impl Default for OptimalPartitioningConfig {
    fn default() -> Self {
        Self {
            penalty: 1.0,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        }
    }
}

impl OptimalPartitioningConfig {
    pub fn validate(&self) -> Result<(), CpdError> {
        validate_penalty("OptimalPartitioningConfig", self.penalty)
    }
}

/// Unpruned O(n²) dynamic program over every candidate.
///
/// Same recursion and tie-breaking as [`crate::Pelt`] and [`crate::Afp`];
/// useful as an exhaustive cross-check of the pruned searches.
#[derive(Debug)]
pub struct OptimalPartitioning {
    config: OptimalPartitioningConfig,
}

impl OptimalPartitioning {
    pub fn new(config: OptimalPartitioningConfig) -> Result<Self, CpdError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &OptimalPartitioningConfig {
        &self.config
    }
}

impl OfflineDetector for OptimalPartitioning {
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
                rule: PruningRule::Exhaustive,
                penalty: self.config.penalty,
                cancel_check_every: self.config.cancel_check_every,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{OptimalPartitioning, OptimalPartitioningConfig};
    use catcpd_core::{Constraints, CountMatrix, ExecutionContext, OfflineDetector};

    #[test]
    fn config_validation_names_the_config() {
        let err = OptimalPartitioning::new(OptimalPartitioningConfig {
            penalty: f64::NAN,
            ..OptimalPartitioningConfig::default()
        })
        .expect_err("NaN penalty must fail");
        assert!(err.to_string().contains("OptimalPartitioningConfig.penalty"));
    }

    #[test]
    fn exhaustive_search_reports_its_algorithm_and_no_pruning() {
        let matrix = CountMatrix::from_labels(&[0, 0, 0, 1, 1, 1], 2).expect("valid labels");
        let constraints = Constraints::default();
        let ctx = ExecutionContext::new(&constraints);
        let detector = OptimalPartitioning::new(OptimalPartitioningConfig::default())
            .expect("config should be valid");
        assert_eq!(detector.config().penalty, 1.0);

        let result = detector
            .detect(&matrix.view(), &ctx)
            .expect("detect should succeed");
        assert_eq!(result.change_points, vec![3]);
        assert_eq!(result.diagnostics.algorithm, "optimal_partitioning");
        let stats = result
            .diagnostics
            .pruning_stats
            .expect("pruning stats are reported");
        assert_eq!(stats.candidates_pruned, 0);
        assert_eq!(stats.candidates_considered, 21);
    }
}

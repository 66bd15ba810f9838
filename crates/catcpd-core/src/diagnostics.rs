// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::borrow::Cow;

/// Diagnostics schema version for segmentation run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Counters that summarize pruning effectiveness during a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruningStats {
    pub candidates_considered: usize,
    pub candidates_pruned: usize,
    /// Candidates removed by the sub-additivity test.
    pub pruned_by_pelt: usize,
    /// Candidates removed by the Lagrangian dominance test.
    pub pruned_by_lagrangian: usize,
    /// Largest admissible-set size observed during the sweep.
    pub max_admissible: usize,
}

/// Structured diagnostics captured from a detector execution.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub n: usize,
    pub d: usize,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub algorithm: Cow<'static, str>,
    pub cost_model: Cow<'static, str>,
    pub penalty: Option<f64>,
    pub cost_evals: usize,
    #[cfg(feature = "serde")]
    pub params_json: Option<serde_json::Value>,
    pub pruning_stats: Option<PruningStats>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            d: 0,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            notes: vec![],
            warnings: vec![],
            algorithm: Cow::Borrowed(""),
            cost_model: Cow::Borrowed(""),
            penalty: None,
            cost_evals: 0,
            #[cfg(feature = "serde")]
            params_json: None,
            pruning_stats: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics, PruningStats};
    use std::borrow::Cow;

    #[test]
    fn diagnostics_default_sets_schema_and_engine_version() {
        let diagnostics = Diagnostics::default();
        assert_eq!(diagnostics.schema_version, DIAGNOSTICS_SCHEMA_VERSION);
        assert_eq!(
            diagnostics.engine_version,
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
        assert_eq!(diagnostics.algorithm, Cow::Borrowed(""));
        assert!(diagnostics.notes.is_empty());
        assert!(diagnostics.warnings.is_empty());
        assert!(diagnostics.penalty.is_none());
        assert!(diagnostics.pruning_stats.is_none());
    }

    #[test]
    fn pruning_stats_split_pruned_candidates_by_rule() {
        let stats = PruningStats {
            candidates_considered: 10_000,
            candidates_pruned: 9_500,
            pruned_by_pelt: 7_000,
            pruned_by_lagrangian: 2_500,
            max_admissible: 12,
        };
        let copied = stats.clone();
        assert_eq!(copied, stats);
        assert_eq!(
            copied.pruned_by_pelt + copied.pruned_by_lagrangian,
            copied.candidates_pruned
        );
        assert_eq!(PruningStats::default().max_admissible, 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn diagnostics_serde_roundtrip_preserves_all_fields() {
        let diagnostics = Diagnostics {
            n: 1_024,
            d: 4,
            runtime_ms: Some(3),
            notes: vec!["penalty=2.5".to_string()],
            warnings: vec!["budget exceeded under SoftDegrade mode".to_string()],
            algorithm: Cow::Owned("afp".to_string()),
            cost_model: Cow::Owned("multinomial".to_string()),
            penalty: Some(2.5),
            cost_evals: 9_000,
            params_json: Some(serde_json::json!({
                "penalty": 2.5,
                "cancel_check_every": 1000
            })),
            pruning_stats: Some(PruningStats {
                candidates_considered: 9_000,
                candidates_pruned: 7_500,
                pruned_by_pelt: 6_000,
                pruned_by_lagrangian: 1_500,
                max_admissible: 42,
            }),
            ..Diagnostics::default()
        };

        let encoded = serde_json::to_string(&diagnostics).expect("diagnostics should serialize");
        let decoded: Diagnostics =
            serde_json::from_str(&encoded).expect("diagnostics should deserialize");
        assert_eq!(decoded, diagnostics);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use catcpd_core::{
    Constraints, CountMatrix, CountMatrixView, CpdError, ExecutionContext, MemoryLayout,
    OfflineDetector, PATH_SENTINEL,
};
use catcpd_offline::{
    Afp, AfpConfig, OptimalPartitioning, OptimalPartitioningConfig, Pelt, PeltConfig, search_afp,
    search_pelt,
};

fn one_hot_two_blocks() -> CountMatrix {
    CountMatrix::from_rows(&[[1_u32, 0], [1, 0], [1, 0], [0, 1], [0, 1], [0, 1]])
        .expect("rows should be valid")
}

fn aggregated_two_blocks() -> CountMatrix {
    CountMatrix::from_rows(&[[5_u32, 0], [5, 0], [5, 0], [0, 5], [0, 5], [0, 5]])
        .expect("rows should be valid")
}

fn detectors(penalty: f64) -> Vec<Box<dyn OfflineDetector>> {
    vec![
        Box::new(
            OptimalPartitioning::new(OptimalPartitioningConfig {
                penalty,
                ..OptimalPartitioningConfig::default()
            })
            .expect("config should be valid"),
        ),
        Box::new(
            Pelt::new(PeltConfig {
                penalty,
                ..PeltConfig::default()
            })
            .expect("config should be valid"),
        ),
        Box::new(
            Afp::new(AfpConfig {
                penalty,
                ..AfpConfig::default()
            })
            .expect("config should be valid"),
        ),
    ]
}

#[test]
fn low_penalty_splits_one_hot_blocks() {
    let matrix = one_hot_two_blocks();
    for path in [
        search_pelt(&matrix.view(), 1.0).expect("pelt should succeed"),
        search_afp(&matrix.view(), 1.0).expect("afp should succeed"),
    ] {
        assert_eq!(path.len(), 7);
        assert_eq!(path.as_slice()[0], PATH_SENTINEL);
        assert_eq!(path.predecessor(6), Some(3));
        assert_eq!(path.predecessor(3), Some(0));
        assert_eq!(path.change_points(), vec![3]);
    }
}

#[test]
fn high_penalty_keeps_one_hot_blocks_together() {
    // one segment costs 6·ln 2 + 10 < 0 + 0 + 20
    let matrix = one_hot_two_blocks();
    for path in [
        search_pelt(&matrix.view(), 10.0).expect("pelt should succeed"),
        search_afp(&matrix.view(), 10.0).expect("afp should succeed"),
    ] {
        assert_eq!(path.predecessor(6), Some(0));
        assert!(path.change_points().is_empty());
    }
}

#[test]
fn aggregated_counts_split_at_the_block_boundary() {
    let matrix = aggregated_two_blocks();
    for penalty in [1.0, 10.0] {
        let pelt = search_pelt(&matrix.view(), penalty).expect("pelt should succeed");
        let afp = search_afp(&matrix.view(), penalty).expect("afp should succeed");
        assert_eq!(pelt, afp);
        assert_eq!(pelt.predecessor(6), Some(3), "penalty={penalty}");
        assert_eq!(pelt.predecessor(3), Some(0), "penalty={penalty}");
    }
}

#[test]
fn aggregated_segment_costs_are_negative() {
    let matrix = aggregated_two_blocks();
    let constraints = Constraints::default();
    let ctx = ExecutionContext::new(&constraints);
    let result = Pelt::new(PeltConfig::default())
        .expect("config should be valid")
        .detect(&matrix.view(), &ctx)
        .expect("detect should succeed");

    let expected = -30.0 * 5.0_f64.ln() + 2.0;
    assert!((result.objective - expected).abs() < 1e-9);
    assert!(result.objective < 0.0);
}

#[test]
fn single_sample_signal_yields_sentinel_and_origin() {
    let matrix = CountMatrix::from_rows(&[[2_u32, 1, 0]]).expect("rows should be valid");
    for path in [
        search_pelt(&matrix.view(), 1.0).expect("pelt should succeed"),
        search_afp(&matrix.view(), 1.0).expect("afp should succeed"),
    ] {
        assert_eq!(path.as_slice(), &[PATH_SENTINEL, 0]);
        assert_eq!(path.to_signed(), vec![-1, 0]);
    }
}

#[test]
fn single_symbol_signal_has_no_change_points() {
    let matrix = CountMatrix::from_labels(&[0; 25], 1).expect("labels should be valid");
    let path = search_afp(&matrix.view(), 0.5).expect("afp should succeed");
    assert!(path.change_points().is_empty());
}

#[test]
fn all_zero_rows_are_accepted() {
    let matrix = CountMatrix::from_rows(&[[0_u32, 0], [0, 0], [1, 0], [0, 0]])
        .expect("rows should be valid");
    let pelt = search_pelt(&matrix.view(), 1.0).expect("pelt should succeed");
    let afp = search_afp(&matrix.view(), 1.0).expect("afp should succeed");
    assert_eq!(pelt, afp);
    assert!(pelt.change_points().is_empty());
}

#[test]
fn every_detector_agrees_on_a_three_block_signal() {
    let labels: Vec<usize> = [vec![0; 12], vec![2; 9], vec![1; 15]].concat();
    let matrix = CountMatrix::from_labels(&labels, 3).expect("labels should be valid");
    let constraints = Constraints::default();
    let ctx = ExecutionContext::new(&constraints);

    let results: Vec<_> = detectors(2.0)
        .iter()
        .map(|detector| {
            detector
                .detect(&matrix.view(), &ctx)
                .expect("detect should succeed")
        })
        .collect();

    for result in &results {
        assert_eq!(result.change_points, vec![12, 21]);
        assert_eq!(result.breakpoints, vec![12, 21, 36]);
        assert_eq!(result.path, results[0].path);
        assert_eq!(result.sum_of_costs, results[0].sum_of_costs);
        assert_eq!(result.objective, 6.0);
    }

    let algorithms: Vec<&str> = results
        .iter()
        .map(|result| &*result.diagnostics.algorithm)
        .collect();
    assert_eq!(algorithms, vec!["optimal_partitioning", "pelt", "afp"]);
}

#[test]
fn column_major_input_gives_the_same_path() {
    let row_major = [1_u32, 0, 1, 0, 0, 1, 0, 1];
    let column_major = [1_u32, 1, 0, 0, 0, 0, 1, 1];
    let c = CountMatrixView::new(&row_major, 4, 2, MemoryLayout::CContiguous)
        .expect("view should be valid");
    let f = CountMatrixView::new(&column_major, 4, 2, MemoryLayout::FContiguous)
        .expect("view should be valid");

    assert_eq!(
        search_afp(&c, 1.0).expect("afp should succeed"),
        search_afp(&f, 1.0).expect("afp should succeed")
    );
}

#[test]
fn repeated_calls_are_bit_identical() {
    let labels: Vec<usize> = (0..300).map(|t| (t * 7 + t / 40) % 3).collect();
    let matrix = CountMatrix::from_labels(&labels, 3).expect("labels should be valid");
    let constraints = Constraints::default();
    let ctx = ExecutionContext::new(&constraints);
    let detector = Afp::new(AfpConfig {
        penalty: 3.0,
        ..AfpConfig::default()
    })
    .expect("config should be valid");

    let first = detector
        .detect(&matrix.view(), &ctx)
        .expect("first run should succeed");
    let second = detector
        .detect(&matrix.view(), &ctx)
        .expect("second run should succeed");

    assert_eq!(first.path, second.path);
    let first_bits: Vec<u64> = first.sum_of_costs.iter().map(|v| v.to_bits()).collect();
    let second_bits: Vec<u64> = second.sum_of_costs.iter().map(|v| v.to_bits()).collect();
    assert_eq!(first_bits, second_bits);
}

#[test]
fn invalid_inputs_are_rejected() {
    let err = CountMatrixView::new(&[], 0, 2, MemoryLayout::CContiguous)
        .expect_err("empty signal must fail");
    assert!(matches!(err, CpdError::InvalidInput(_)));

    let err = CountMatrix::from_i64(&[1, -1], 1, 2).expect_err("negative counts must fail");
    assert!(matches!(err, CpdError::InvalidInput(_)));

    let matrix = one_hot_two_blocks();
    for bad in [-0.5, f64::NAN, f64::INFINITY] {
        let err = search_pelt(&matrix.view(), bad).expect_err("invalid penalty must fail");
        assert!(matches!(err, CpdError::InvalidInput(_)));
        let err = search_afp(&matrix.view(), bad).expect_err("invalid penalty must fail");
        assert!(matches!(err, CpdError::InvalidInput(_)));
    }
}

#[cfg(feature = "serde")]
#[test]
fn results_and_configs_serde_roundtrip() {
    let matrix = one_hot_two_blocks();
    let constraints = Constraints::default();
    let ctx = ExecutionContext::new(&constraints);
    let config = AfpConfig {
        penalty: 2.5,
        cancel_check_every: 64,
    };
    let result = Afp::new(config.clone())
        .expect("config should be valid")
        .detect(&matrix.view(), &ctx)
        .expect("detect should succeed");

    let params = result
        .diagnostics
        .params_json
        .clone()
        .expect("params are recorded");
    assert_eq!(params["penalty"], 2.5);
    assert_eq!(params["cancel_check_every"], 64);

    let encoded = serde_json::to_string(&result).expect("result should serialize");
    let decoded: catcpd_core::OfflineChangePointResult =
        serde_json::from_str(&encoded).expect("result should deserialize");
    assert_eq!(decoded, result);

    let encoded = serde_json::to_string(&config).expect("config should serialize");
    let decoded: AfpConfig = serde_json::from_str(&encoded).expect("config should deserialize");
    assert_eq!(decoded, config);
}

#[cfg(feature = "serde")]
#[test]
fn deserialized_inputs_and_paths_are_validated() {
    let matrix: CountMatrix = serde_json::from_str(r#"{"values":[1,0,0,1],"n":2,"d":2}"#)
        .expect("consistent matrix should deserialize");
    let path = search_pelt(&matrix.view(), 1.0).expect("pelt should succeed");
    assert_eq!(path.len(), 3);

    let err = serde_json::from_str::<CountMatrix>(r#"{"values":[1,0],"n":5,"d":2}"#)
        .expect_err("shape mismatch must not deserialize");
    assert!(err.to_string().contains("value length mismatch"));

    let err = serde_json::from_str::<catcpd_core::ChangePointPath>(r#"{"entries":[5,7,9]}"#)
        .expect_err("path without sentinel must not deserialize");
    assert!(err.to_string().contains("sentinel"));
}

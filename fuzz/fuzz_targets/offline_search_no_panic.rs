// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

#[path = "common.rs"]
mod common;

use catcpd_core::{
    BudgetMode, Constraints, CountMatrixView, ExecutionContext, MemoryLayout, OfflineDetector,
};
use catcpd_offline::{Afp, AfpConfig, Pelt, PeltConfig};
use libfuzzer_sys::fuzz_target;

fn build_penalty(seed: u8) -> f64 {
    match seed % 8 {
        0 => 0.0,
        1 => f64::NAN,
        2 => -1.0,
        _ => f64::from(seed) / 8.0,
    }
}

fn build_cost_eval_budget(seed: u8) -> Option<usize> {
    match seed % 8 {
        0 => Some(0),
        1 => Some(usize::from(seed)),
        _ => None,
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = common::ByteCursor::new(data);

    let d = common::bounded(cursor.next_u8(), 1, 6);
    let layout = if cursor.next_u8() & 1 == 0 {
        MemoryLayout::CContiguous
    } else {
        MemoryLayout::FContiguous
    };
    let penalty = build_penalty(cursor.next_u8());
    let budget_mode = if cursor.next_u8() & 1 == 0 {
        BudgetMode::HardFail
    } else {
        BudgetMode::SoftDegrade
    };
    let constraints = Constraints {
        max_cost_evals: build_cost_eval_budget(cursor.next_u8()),
        ..Constraints::default()
    };

    let values: Vec<u32> = cursor
        .remaining()
        .iter()
        .take(d * 256)
        .map(|byte| u32::from(*byte % 32))
        .collect();
    let n = values.len() / d;
    let Ok(view) = CountMatrixView::new(&values[..n * d], n, d, layout) else {
        return;
    };

    let ctx = ExecutionContext::new(&constraints).with_budget_mode(budget_mode);
    let pelt = Pelt::new(PeltConfig {
        penalty,
        cancel_check_every: 7,
    });
    let afp = Afp::new(AfpConfig {
        penalty,
        cancel_check_every: 7,
    });
    let (Ok(pelt), Ok(afp)) = (pelt, afp) else {
        return;
    };

    let pelt_result = pelt.detect(&view, &ctx);
    let afp_result = afp.detect(&view, &ctx);

    if let (Ok(pelt_result), Ok(afp_result)) = (pelt_result, afp_result) {
        assert_eq!(pelt_result.path.len(), n + 1);
        assert_eq!(afp_result.path.len(), n + 1);
        let scale = 1.0 + pelt_result.objective.abs();
        assert!((pelt_result.objective - afp_result.objective).abs() <= 1e-9 * scale);
    }
});

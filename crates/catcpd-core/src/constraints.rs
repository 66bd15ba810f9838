// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::CpdError;

/// Per-call resource limits. `None` means unlimited.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Constraints {
    pub time_budget_ms: Option<u64>,
    pub max_cost_evals: Option<usize>,
    pub memory_budget_bytes: Option<usize>,
}

/// Rejects zero-valued limits, which could never be satisfied by a run.
pub fn validate_constraints(constraints: &Constraints) -> Result<(), CpdError> {
    if constraints.time_budget_ms == Some(0) {
        return Err(CpdError::invalid_input(
            "constraints.time_budget_ms must be >= 1 when set; got 0",
        ));
    }
    if constraints.max_cost_evals == Some(0) {
        return Err(CpdError::invalid_input(
            "constraints.max_cost_evals must be >= 1 when set; got 0",
        ));
    }
    if constraints.memory_budget_bytes == Some(0) {
        return Err(CpdError::invalid_input(
            "constraints.memory_budget_bytes must be >= 1 when set; got 0",
        ));
    }
    Ok(())
}

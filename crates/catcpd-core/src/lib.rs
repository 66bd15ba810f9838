// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Core shared types for penalized multinomial change-point search.

pub mod constraints;
pub mod control;
pub mod count_matrix;
pub mod detectors;
pub mod diagnostics;
pub mod error;
pub mod execution_context;
pub mod observability;
pub mod prefix;
pub mod results;

pub use constraints::{Constraints, validate_constraints};
pub use control::{BudgetMode, BudgetStatus, CancelToken};
pub use count_matrix::{CountMatrix, CountMatrixView, MemoryLayout};
pub use detectors::OfflineDetector;
pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics, PruningStats};
pub use error::CpdError;
pub use execution_context::ExecutionContext;
pub use observability::{ProgressSink, TelemetrySink};
pub use prefix::CumulativeCounts;
pub use results::{
    ChangePointPath, OfflineChangePointResult, PATH_SENTINEL, segments_from_breakpoints,
    validate_breakpoints,
};

/// Core shared types and traits for catcpd.
pub fn crate_name() -> &'static str {
    "catcpd-core"
}

// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod model;
pub mod multinomial;

pub use model::CostModel;
pub use multinomial::{CostMultinomial, MultinomialCache, cost_from_counts, xlogx};

/// Built-in cost model namespace.
pub fn crate_name() -> &'static str {
    let _ = catcpd_core::crate_name();
    "catcpd-costs"
}

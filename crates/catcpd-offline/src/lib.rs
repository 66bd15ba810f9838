// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Exact penalized segmentation of categorical count sequences.
//!
//! [`Pelt`] and [`Afp`] return the same optimal path; `Afp` additionally
//! discards candidates through a Lagrangian dominance test and usually keeps
//! a much smaller admissible set. [`OptimalPartitioning`] never prunes.

pub mod admissible;
pub mod afp;
pub mod op;
pub mod pelt;
mod sweep;

pub use admissible::AdmissibleSet;
pub use afp::{
    Afp, AfpConfig, LAMBDA_INTERIOR_FRACTION, LagrangianInputs, lagrangian_bound,
    lambda_upper_bound, search_afp,
};
pub use op::{OptimalPartitioning, OptimalPartitioningConfig};
pub use pelt::{Pelt, PeltConfig, search_pelt};

/// Offline detector namespace.
pub fn crate_name() -> &'static str {
    let _ = (catcpd_core::crate_name(), catcpd_costs::crate_name());
    "catcpd-offline"
}

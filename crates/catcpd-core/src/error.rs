// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use thiserror::Error;

/// Error taxonomy shared by every catcpd crate.
///
/// Every variant is fatal to the call that produced it: detectors never
/// return partial segmentations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CpdError {
    /// Malformed input rejected at the construction boundary.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A cost or score evaluated to a non-finite value.
    #[error("numerical issue: {0}")]
    NumericalIssue(String),
    /// Allocation failure, exceeded budget, or counter overflow.
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),
    /// Cooperative cancellation was observed.
    #[error("cancelled")]
    Cancelled,
}

impl CpdError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn numerical_issue(message: impl Into<String>) -> Self {
        Self::NumericalIssue(message.into())
    }

    pub fn resource_limit(message: impl Into<String>) -> Self {
        Self::ResourceLimit(message.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::results::OfflineChangePointResult;
use crate::{CountMatrixView, CpdError, ExecutionContext};

/// Offline detector contract: full count matrix in, full result out.
pub trait OfflineDetector {
    fn detect(
        &self,
        x: &CountMatrixView<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<OfflineChangePointResult, CpdError>;
}

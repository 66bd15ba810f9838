// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::CpdError;
use crate::constraints::Constraints;
use crate::control::{BudgetMode, BudgetStatus, CancelToken};
use crate::observability::{ProgressSink, TelemetrySink};
use std::time::Instant;

/// Unified execution context passed through detector calls.
pub struct ExecutionContext<'a> {
    pub constraints: &'a Constraints,
    pub cancel: Option<&'a CancelToken>,
    pub budget_mode: BudgetMode,
    pub progress: Option<&'a dyn ProgressSink>,
    pub telemetry: Option<&'a dyn TelemetrySink>,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with hard-fail budgets and no optional hooks.
    pub fn new(constraints: &'a Constraints) -> Self {
        Self {
            constraints,
            cancel: None,
            budget_mode: BudgetMode::HardFail,
            progress: None,
            telemetry: None,
        }
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_budget_mode(mut self, budget_mode: BudgetMode) -> Self {
        self.budget_mode = budget_mode;
        self
    }

    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_telemetry_sink(mut self, telemetry: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    pub fn check_cancelled(&self) -> Result<(), CpdError> {
        if self.is_cancelled() {
            return Err(CpdError::cancelled());
        }
        Ok(())
    }

    /// Checks cancellation every `every` iterations.
    ///
    /// When `every` is zero, it is treated as one (always poll).
    pub fn check_cancelled_every(&self, iteration: usize, every: usize) -> Result<(), CpdError> {
        let every = every.max(1);
        if iteration % every != 0 {
            return Ok(());
        }
        self.check_cancelled()
    }

    pub fn check_cost_eval_budget(&self, cost_evals: usize) -> Result<BudgetStatus, CpdError> {
        let Some(limit) = self.constraints.max_cost_evals else {
            return Ok(BudgetStatus::WithinBudget);
        };

        if cost_evals <= limit {
            return Ok(BudgetStatus::WithinBudget);
        }

        self.exceeded(format!(
            "constraints.max_cost_evals exceeded: used={cost_evals}, limit={limit}, budget_mode={:?}",
            self.budget_mode
        ))
    }

    pub fn check_time_budget(&self, started_at: Instant) -> Result<BudgetStatus, CpdError> {
        let Some(limit_ms) = self.constraints.time_budget_ms else {
            return Ok(BudgetStatus::WithinBudget);
        };

        let elapsed_ms = started_at.elapsed().as_millis();
        if elapsed_ms <= u128::from(limit_ms) {
            return Ok(BudgetStatus::WithinBudget);
        }

        self.exceeded(format!(
            "constraints.time_budget_ms exceeded: elapsed_ms={elapsed_ms}, limit_ms={limit_ms}, budget_mode={:?}",
            self.budget_mode
        ))
    }

    /// Checks a planned allocation against `constraints.memory_budget_bytes`.
    ///
    /// Memory is never degraded softly: an allocation over budget always fails.
    pub fn check_memory_budget(&self, what: &str, required_bytes: usize) -> Result<(), CpdError> {
        let Some(limit) = self.constraints.memory_budget_bytes else {
            return Ok(());
        };

        if required_bytes > limit {
            return Err(CpdError::resource_limit(format!(
                "{what} requires {required_bytes} bytes, exceeds constraints.memory_budget_bytes={limit}"
            )));
        }
        Ok(())
    }

    /// Emits clamped progress to the sink, if configured.
    pub fn report_progress(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }

        if let Some(sink) = self.progress {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }

    pub fn record_scalar(&self, key: &'static str, value: f64) {
        if let Some(sink) = self.telemetry {
            sink.record_scalar(key, value);
        }
    }

    fn exceeded(&self, message: String) -> Result<BudgetStatus, CpdError> {
        match self.budget_mode {
            BudgetMode::HardFail => Err(CpdError::resource_limit(message)),
            BudgetMode::SoftDegrade => Ok(BudgetStatus::ExceededSoftDegrade),
        }
    }
}

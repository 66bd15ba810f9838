// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::admissible::AdmissibleSet;
use crate::afp::{LagrangianScratch, lagrangian_dominated};
use catcpd_core::{
    BudgetStatus, ChangePointPath, CountMatrixView, CpdError, Diagnostics, ExecutionContext,
    OfflineChangePointResult, PATH_SENTINEL, PruningStats, validate_constraints,
};
use catcpd_costs::{CostModel, CostMultinomial, MultinomialCache};
use std::borrow::Cow;
use std::time::Instant;

pub(crate) const DEFAULT_CANCEL_CHECK_EVERY: usize = 1000;

/// Which candidates the forward sweep may discard after each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PruningRule {
    /// Keep every candidate (optimal partitioning).
    Exhaustive,
    /// Sub-additivity test only.
    Pelt,
    /// Sub-additivity test, then the Lagrangian dominance test.
    Afp,
}

struct TelemetryKeys {
    cost_evals: &'static str,
    candidates_considered: &'static str,
    candidates_pruned: &'static str,
    runtime_ms: &'static str,
}

impl PruningRule {
    pub(crate) fn algorithm(self) -> &'static str {
        match self {
            Self::Exhaustive => "optimal_partitioning",
            Self::Pelt => "pelt",
            Self::Afp => "afp",
        }
    }

    fn telemetry_keys(self) -> TelemetryKeys {
        match self {
            Self::Exhaustive => TelemetryKeys {
                cost_evals: "offline.optimal_partitioning.cost_evals",
                candidates_considered: "offline.optimal_partitioning.candidates_considered",
                candidates_pruned: "offline.optimal_partitioning.candidates_pruned",
                runtime_ms: "offline.optimal_partitioning.runtime_ms",
            },
            Self::Pelt => TelemetryKeys {
                cost_evals: "offline.pelt.cost_evals",
                candidates_considered: "offline.pelt.candidates_considered",
                candidates_pruned: "offline.pelt.candidates_pruned",
                runtime_ms: "offline.pelt.runtime_ms",
            },
            Self::Afp => TelemetryKeys {
                cost_evals: "offline.afp.cost_evals",
                candidates_considered: "offline.afp.candidates_considered",
                candidates_pruned: "offline.afp.candidates_pruned",
                runtime_ms: "offline.afp.runtime_ms",
            },
        }
    }
}

/// Per-run parameters shared by every detector.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RunSpec {
    pub rule: PruningRule,
    pub penalty: f64,
    pub cancel_check_every: usize,
}

#[derive(Default, Clone, Copy, Debug)]
struct RuntimeStats {
    cost_evals: usize,
    candidates_considered: usize,
    candidates_pruned: usize,
    pruned_by_pelt: usize,
    pruned_by_afp: usize,
    max_admissible: usize,
    soft_budget_exceeded: bool,
}

struct SweepOutput {
    path: ChangePointPath,
    sum_of_costs: Vec<f64>,
}

fn checked_counter_increment(counter: &mut usize, name: &str) -> Result<(), CpdError> {
    *counter = counter
        .checked_add(1)
        .ok_or_else(|| CpdError::resource_limit(format!("{name} counter overflow")))?;
    Ok(())
}

/// Rejects penalties that are negative, NaN, or infinite.
pub(crate) fn validate_penalty(owner: &str, penalty: f64) -> Result<(), CpdError> {
    if !penalty.is_finite() || penalty < 0.0 {
        return Err(CpdError::invalid_input(format!(
            "{owner}.penalty must be finite and >= 0.0; got {penalty}"
        )));
    }
    Ok(())
}

/// Bytes held by the sweep itself: sum of costs, path, admissible set, and
/// per-step scores, each sized `n + 1`.
fn sweep_bytes(n: usize) -> usize {
    let per_entry = 2 * std::mem::size_of::<usize>() + 2 * std::mem::size_of::<f64>();
    n.checked_add(1)
        .and_then(|len| len.checked_mul(per_entry))
        .unwrap_or(usize::MAX)
}

fn try_alloc<T: Clone>(len: usize, fill: T, what: &str) -> Result<Vec<T>, CpdError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|err| {
        CpdError::resource_limit(format!("failed to allocate {what} of {len} entries: {err}"))
    })?;
    buffer.resize(len, fill);
    Ok(buffer)
}

fn track_budget(status: BudgetStatus, runtime: &mut RuntimeStats) {
    if status == BudgetStatus::ExceededSoftDegrade {
        runtime.soft_budget_exceeded = true;
    }
}

fn evaluate_segment_cost(
    cache: &MultinomialCache,
    start: usize,
    end: usize,
    ctx: &ExecutionContext<'_>,
    runtime: &mut RuntimeStats,
) -> Result<f64, CpdError> {
    checked_counter_increment(&mut runtime.cost_evals, "cost_evals")?;
    track_budget(ctx.check_cost_eval_budget(runtime.cost_evals)?, runtime);

    let segment_cost = CostMultinomial.segment_cost(cache, start, end);
    if !segment_cost.is_finite() {
        return Err(CpdError::numerical_issue(format!(
            "non-finite segment cost at [{start}, {end}): {segment_cost}"
        )));
    }
    Ok(segment_cost)
}

/// Forward dynamic program over end indices `1..=n`.
///
/// `SoC[t] = min_{tau in admissible} SoC[tau] + cost([tau, t)) + penalty`,
/// ties resolved toward the smallest `tau`. After each step the candidates
/// are pruned according to `spec.rule` and `t` joins the admissible set.
fn run_sweep(
    x: &CountMatrixView<'_>,
    cache: &MultinomialCache,
    spec: &RunSpec,
    ctx: &ExecutionContext<'_>,
    started_at: Instant,
    runtime: &mut RuntimeStats,
) -> Result<SweepOutput, CpdError> {
    let n = x.n;
    let penalty = spec.penalty;
    let cancel_check_every = spec.cancel_check_every.max(1);

    let mut sum_of_costs = try_alloc(n + 1, 0.0_f64, "sum-of-costs buffer")?;
    let mut path = try_alloc(n + 1, PATH_SENTINEL, "path buffer")?;
    let mut scores: Vec<f64> = Vec::new();
    let mut admissible = AdmissibleSet::try_with_capacity(match spec.rule {
        PruningRule::Exhaustive => n + 1,
        PruningRule::Pelt | PruningRule::Afp => 16,
    })?;
    let mut scratch = LagrangianScratch::new(x.d);
    runtime.max_admissible = admissible.len();

    for t in 1..=n {
        if (t - 1) % cancel_check_every == 0 {
            ctx.check_cancelled()?;
            track_budget(ctx.check_time_budget(started_at)?, runtime);
        }

        scores.clear();
        let mut best_cost = f64::INFINITY;
        let mut best_tau = PATH_SENTINEL;

        for tau in admissible.iter() {
            let segment_cost = evaluate_segment_cost(cache, tau, t, ctx, runtime)?;
            checked_counter_increment(
                &mut runtime.candidates_considered,
                "candidates_considered",
            )?;

            let score_no_penalty = sum_of_costs[tau] + segment_cost;
            let candidate = score_no_penalty + penalty;
            if !candidate.is_finite() {
                return Err(CpdError::numerical_issue(format!(
                    "non-finite objective at t={t}, tau={tau}: SoC(tau)={}, segment_cost={segment_cost}, penalty={penalty}, candidate={candidate}",
                    sum_of_costs[tau]
                )));
            }

            scores.push(score_no_penalty);
            if candidate < best_cost {
                best_cost = candidate;
                best_tau = tau;
            }
        }

        sum_of_costs[t] = best_cost;
        path[t] = best_tau;

        if t == n {
            break;
        }

        if spec.rule != PruningRule::Exhaustive {
            let threshold = sum_of_costs[t];
            let soc = &sum_of_costs;
            let removed = admissible.try_retain_scan(|position, previous, tau| {
                if scores[position] > threshold {
                    checked_counter_increment(&mut runtime.pruned_by_pelt, "pruned_by_pelt")?;
                    return Ok(false);
                }
                if spec.rule == PruningRule::Afp
                    && let Some(compare) = previous
                    && lagrangian_dominated(cache, compare, tau, t, soc, penalty, &mut scratch)?
                {
                    checked_counter_increment(&mut runtime.pruned_by_afp, "pruned_by_afp")?;
                    return Ok(false);
                }
                Ok(true)
            })?;
            runtime.candidates_pruned = runtime
                .candidates_pruned
                .checked_add(removed)
                .ok_or_else(|| CpdError::resource_limit("candidates_pruned counter overflow"))?;
        }

        admissible.push(t);
        runtime.max_admissible = runtime.max_admissible.max(admissible.len());

        ctx.report_progress(t as f32 / n as f32);
    }

    Ok(SweepOutput {
        path: ChangePointPath::from_entries(path)?,
        sum_of_costs,
    })
}

/// Validates, precomputes, sweeps, and assembles the result with diagnostics
/// and telemetry.
pub(crate) fn run_detector(
    x: &CountMatrixView<'_>,
    ctx: &ExecutionContext<'_>,
    spec: RunSpec,
) -> Result<OfflineChangePointResult, CpdError> {
    validate_constraints(ctx.constraints)?;

    let model = CostMultinomial;
    model.validate(x)?;
    let required_bytes = model
        .worst_case_cache_bytes(x)
        .saturating_add(sweep_bytes(x.n));
    ctx.check_memory_budget("segmentation run", required_bytes)?;

    #[cfg(feature = "tracing")]
    let span = tracing::info_span!(
        "catcpd_detect",
        algorithm = spec.rule.algorithm(),
        n = x.n,
        d = x.d
    );
    #[cfg(feature = "tracing")]
    let _enter = span.enter();

    let cache = model.precompute(x, ctx)?;

    let started_at = Instant::now();
    let mut runtime = RuntimeStats::default();
    let sweep = run_sweep(x, &cache, &spec, ctx, started_at, &mut runtime)?;

    let mut notes = vec![format!("penalty={}", spec.penalty)];
    let mut warnings = vec![];

    if spec.penalty == 0.0 {
        warnings.push(
            "penalty=0 adds nothing per segment; every split that lowers the cost is taken"
                .to_string(),
        );
    }
    if runtime.soft_budget_exceeded {
        warnings.push(
            "budget exceeded under SoftDegrade mode; run continued to completion".to_string(),
        );
    }

    let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);

    let keys = spec.rule.telemetry_keys();
    ctx.record_scalar(keys.cost_evals, runtime.cost_evals as f64);
    ctx.record_scalar(
        keys.candidates_considered,
        runtime.candidates_considered as f64,
    );
    ctx.record_scalar(keys.candidates_pruned, runtime.candidates_pruned as f64);
    if spec.rule == PruningRule::Afp {
        ctx.record_scalar("offline.afp.pruned_by_afp", runtime.pruned_by_afp as f64);
    }
    ctx.record_scalar(keys.runtime_ms, runtime_ms as f64);
    ctx.report_progress(1.0);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        cost_evals = runtime.cost_evals,
        candidates_pruned = runtime.candidates_pruned,
        pruned_by_pelt = runtime.pruned_by_pelt,
        pruned_by_afp = runtime.pruned_by_afp,
        max_admissible = runtime.max_admissible,
        runtime_ms,
        "sweep finished"
    );

    let objective = sweep.sum_of_costs[x.n];
    notes.push(format!(
        "final_objective={objective}, change_count={}",
        sweep.path.change_points().len()
    ));
    notes.push(format!("run_cost_evals={}", runtime.cost_evals));
    notes.push(format!(
        "run_candidates_considered={}, run_candidates_pruned={}, max_admissible={}",
        runtime.candidates_considered, runtime.candidates_pruned, runtime.max_admissible
    ));

    let diagnostics = Diagnostics {
        n: x.n,
        d: x.d,
        runtime_ms: Some(runtime_ms),
        notes,
        warnings,
        algorithm: Cow::Borrowed(spec.rule.algorithm()),
        cost_model: Cow::Borrowed(model.name()),
        penalty: Some(spec.penalty),
        cost_evals: runtime.cost_evals,
        #[cfg(feature = "serde")]
        params_json: Some(serde_json::json!({
            "penalty": spec.penalty,
            "cancel_check_every": spec.cancel_check_every,
        })),
        pruning_stats: Some(PruningStats {
            candidates_considered: runtime.candidates_considered,
            candidates_pruned: runtime.candidates_pruned,
            pruned_by_pelt: runtime.pruned_by_pelt,
            pruned_by_lagrangian: runtime.pruned_by_afp,
            max_admissible: runtime.max_admissible,
        }),
        ..Diagnostics::default()
    };

    OfflineChangePointResult::new(sweep.path, sweep.sum_of_costs, diagnostics)
}

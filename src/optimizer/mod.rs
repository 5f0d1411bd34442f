//! Roster optimizer: picks the subset of candidates that maximizes total score while
//! meeting every position quota exactly and staying under the salary cap.
//!
//! Inputs are assumed clean (finite scores, finite non-negative cap hits, unique ids).
//! Anything else fails fast with [OptimizeError::Validation] before a model is built.

pub mod milp;
pub mod sweep;
pub mod time_limit;

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::RosterConstraints;
use crate::data::candidate::{Candidate, PositionCategory};

/// Relative slack allowed on the budget row when re-checking a solved roster.
const CAP_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    /// Bad input or configuration, reported before any solve.
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// No roster satisfies every constraint.
    #[error("no feasible roster: {0}")]
    Infeasible(String),

    /// The solver failed, timed out, or returned an inconsistent assignment.
    #[error("solver error: {0}")]
    Solver(String),
}

impl OptimizeError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Infeasible(_) => "infeasible",
            Self::Solver(_) => "solver_error",
        }
    }
}

/// Optimal roster for one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Selected candidates ordered forwards, defensemen, goalies; best score first within each.
    pub selected: Vec<Candidate>,
    pub total_score: f64,
    pub total_cap_hit: f64,
    pub salary_cap: f64,
    pub cap_space: f64,
}

impl Solution {
    fn from_selection(candidates: &[Candidate], indices: &[usize], salary_cap: f64) -> Self {
        let mut selected: Vec<Candidate> =
            indices.iter().map(|&index| candidates[index].clone()).collect();
        selected.sort_by(|left, right| {
            left.category()
                .cmp(&right.category())
                .then_with(|| right.score.total_cmp(&left.score))
                .then_with(|| left.id.cmp(&right.id))
        });
        let total_score = selected.iter().map(|c| c.score).sum();
        let total_cap_hit: f64 = selected.iter().map(|c| c.cap_hit).sum();
        Self {
            selected,
            total_score,
            total_cap_hit,
            salary_cap,
            cap_space: salary_cap - total_cap_hit,
        }
    }

    pub fn count(&self, category: PositionCategory) -> usize {
        self.selected
            .iter()
            .filter(|c| c.category() == category)
            .count()
    }
}

/// Solve one roster selection. Exactly one MILP solve runs per call.
pub fn optimize_roster(
    candidates: &[Candidate],
    constraints: &RosterConstraints,
) -> Result<Solution, OptimizeError> {
    validate_inputs(candidates, constraints)?;
    check_quota_feasibility(candidates, constraints)?;

    info!(
        event = "solve_start",
        candidates = candidates.len(),
        roster_size = constraints.roster_size(),
        salary_cap = constraints.salary_cap,
    );

    let indices = if constraints.roster_size() == 0 {
        Vec::new()
    } else {
        match constraints.time_limit() {
            Some(limit) => {
                let owned = candidates.to_vec();
                let owned_constraints = constraints.clone();
                time_limit::run_with_time_limit(limit, move || {
                    milp::solve_assignment(&owned, &owned_constraints)
                })?
            }
            None => milp::solve_assignment(candidates, constraints)?,
        }
    };

    verify_assignment(candidates, constraints, &indices)?;
    let solution = Solution::from_selection(candidates, &indices, constraints.salary_cap);
    info!(
        event = "solve_end",
        total_score = solution.total_score,
        total_cap_hit = solution.total_cap_hit,
        cap_space = solution.cap_space,
    );
    Ok(solution)
}

/// Reject malformed inputs. Errors name the offending field, e.g. `candidates[3].cap_hit`.
pub fn validate_inputs(
    candidates: &[Candidate],
    constraints: &RosterConstraints,
) -> Result<(), OptimizeError> {
    let cap = constraints.salary_cap;
    if !cap.is_finite() || cap < 0.0 {
        return Err(OptimizeError::validation(
            "salary_cap",
            format!("must be a finite non-negative amount, got {cap}"),
        ));
    }
    if let Some(secs) = constraints.time_limit_seconds {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(OptimizeError::validation(
                "time_limit_seconds",
                format!("must be positive, got {secs}"),
            ));
        }
    }
    if candidates.is_empty() {
        return Err(OptimizeError::validation(
            "candidates",
            "at least one candidate is required",
        ));
    }

    let mut seen = HashSet::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.id.trim().is_empty() {
            return Err(OptimizeError::validation(
                format!("candidates[{index}].id"),
                "must be non-empty",
            ));
        }
        if !seen.insert(candidate.id.as_str()) {
            return Err(OptimizeError::validation(
                format!("candidates[{index}].id"),
                format!("duplicate id '{}'", candidate.id),
            ));
        }
        if !candidate.score.is_finite() {
            return Err(OptimizeError::validation(
                format!("candidates[{index}].score"),
                format!("must be finite, got {}", candidate.score),
            ));
        }
        if !candidate.cap_hit.is_finite() || candidate.cap_hit < 0.0 {
            return Err(OptimizeError::validation(
                format!("candidates[{index}].cap_hit"),
                format!("must be a finite non-negative amount, got {}", candidate.cap_hit),
            ));
        }
    }
    Ok(())
}

/// Detect infeasibility without solving. Categories are independent, so the cheapest
/// possible roster takes the cheapest `quota` players of each category.
fn check_quota_feasibility(
    candidates: &[Candidate],
    constraints: &RosterConstraints,
) -> Result<(), OptimizeError> {
    let mut costs: HashMap<PositionCategory, Vec<f64>> = HashMap::new();
    for candidate in candidates {
        costs
            .entry(candidate.category())
            .or_default()
            .push(candidate.cap_hit);
    }

    let mut cheapest_roster = 0.0;
    for category in PositionCategory::ALL {
        let needed = constraints.quota(category) as usize;
        let pool = costs.entry(category).or_default();
        if pool.len() < needed {
            return Err(OptimizeError::Infeasible(format!(
                "{needed} {category}(s) required but only {} eligible",
                pool.len()
            )));
        }
        pool.sort_by(f64::total_cmp);
        cheapest_roster += pool.iter().take(needed).sum::<f64>();
    }

    debug!(cheapest_roster, salary_cap = constraints.salary_cap, "quota precheck");
    if cheapest_roster > constraints.salary_cap {
        return Err(OptimizeError::Infeasible(format!(
            "cheapest roster meeting all quotas costs {cheapest_roster} which exceeds the cap of {}",
            constraints.salary_cap
        )));
    }
    Ok(())
}

/// Re-check the solver's assignment against every constraint.
fn verify_assignment(
    candidates: &[Candidate],
    constraints: &RosterConstraints,
    indices: &[usize],
) -> Result<(), OptimizeError> {
    for category in PositionCategory::ALL {
        let picked = indices
            .iter()
            .filter(|&&index| candidates[index].category() == category)
            .count();
        let needed = constraints.quota(category) as usize;
        if picked != needed {
            return Err(OptimizeError::Solver(format!(
                "assignment selects {picked} {category}(s), expected {needed}"
            )));
        }
    }

    let spent: f64 = indices.iter().map(|&index| candidates[index].cap_hit).sum();
    let allowed = constraints.salary_cap + constraints.salary_cap.abs().max(1.0) * CAP_TOLERANCE;
    if spent > allowed {
        return Err(OptimizeError::Solver(format!(
            "assignment spends {spent} over the cap of {}",
            constraints.salary_cap
        )));
    }
    Ok(())
}

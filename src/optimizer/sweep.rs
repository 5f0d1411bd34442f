//! Solve the same candidate pool under several salary caps.
//!
//! Each cap is an independent solve with no shared state, so the batch fans out across a
//! Rayon pool. Points come back in the order the caps were given.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::RosterConstraints;
use crate::data::candidate::Candidate;
use crate::optimizer::{optimize_roster, validate_inputs, OptimizeError, Solution};
use crate::parallel::WorkerPool;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub salary_cap: f64,
    /// `optimal`, or the failure kind (`infeasible`, `solver_error`, `validation_error`).
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cap_hit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SweepPoint {
    fn from_outcome(salary_cap: f64, outcome: Result<Solution, OptimizeError>) -> Self {
        match outcome {
            Ok(solution) => Self {
                salary_cap,
                status: "optimal",
                total_score: Some(solution.total_score),
                total_cap_hit: Some(solution.total_cap_hit),
                message: None,
            },
            Err(err) => Self {
                salary_cap,
                status: err.kind(),
                total_score: None,
                total_cap_hit: None,
                message: Some(err.to_string()),
            },
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == "optimal"
    }
}

/// One solve per cap in `caps`, all other constraints taken from `base`.
///
/// Candidate problems fail the whole sweep up front; a bad or infeasible cap only marks
/// its own point.
pub fn sweep_salary_caps(
    candidates: &[Candidate],
    base: &RosterConstraints,
    caps: &[f64],
    pool: &WorkerPool,
) -> Result<Vec<SweepPoint>, OptimizeError> {
    validate_inputs(candidates, base)?;
    info!(event = "sweep_start", caps = caps.len(), threads = pool.thread_count());

    pool.install(|| {
        caps.par_iter()
            .map(|&cap| {
                let constraints = base.clone().with_salary_cap(cap);
                SweepPoint::from_outcome(cap, optimize_roster(candidates, &constraints))
            })
            .collect()
    })
    .map_err(|err| OptimizeError::Solver(format!("failed to build worker pool: {err}")))
}

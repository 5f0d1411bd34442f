//! Binary integer program for roster selection, solved with `good_lp` on the pure-Rust
//! `microlp` branch-and-bound backend.
//!
//! One binary variable per candidate whose category has a non-zero quota. Candidates in a
//! zero-quota category can never be picked, so they get no variable at all.

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use tracing::debug;

use crate::config::RosterConstraints;
use crate::data::candidate::{Candidate, PositionCategory};
use crate::optimizer::OptimizeError;

/// Solve the roster program and return the indices of the selected candidates.
pub fn solve_assignment(
    candidates: &[Candidate],
    constraints: &RosterConstraints,
) -> Result<Vec<usize>, OptimizeError> {
    let mut vars = ProblemVariables::new();
    let picks: Vec<(usize, Variable)> = candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| constraints.quota(candidate.category()) > 0)
        .map(|(index, _)| (index, vars.add(variable().binary().name(format!("pick_{index}")))))
        .collect();

    if picks.is_empty() {
        return Ok(Vec::new());
    }

    // Budget row stays in dollars. Dividing by the cap pushes whole-dollar differences
    // below the backend's feasibility tolerance.
    let budget = constraints.salary_cap;

    let objective: Expression = picks
        .iter()
        .map(|&(index, var)| candidates[index].score * var)
        .sum();
    let spend: Expression = picks
        .iter()
        .map(|&(index, var)| candidates[index].cap_hit * var)
        .sum();

    let mut model = vars.maximise(objective).using(microlp);
    model.add_constraint(constraint!(spend <= budget));

    for category in PositionCategory::ALL {
        let needed = constraints.quota(category);
        if needed == 0 {
            continue;
        }
        let required = f64::from(needed);
        let count: Expression = picks
            .iter()
            .filter(|&&(index, _)| candidates[index].category() == category)
            .map(|&(_, var)| var)
            .sum();
        model.add_constraint(constraint!(count == required));
    }

    debug!(variables = picks.len(), "roster model built");

    let solution = model.solve().map_err(|err| match err {
        ResolutionError::Infeasible => {
            OptimizeError::Infeasible("solver proved no roster meets every constraint".to_string())
        }
        ResolutionError::Unbounded => {
            OptimizeError::Solver("solver reported an unbounded objective".to_string())
        }
        other => OptimizeError::Solver(other.to_string()),
    })?;

    Ok(picks
        .iter()
        .filter(|&&(_, var)| solution.value(var) > 0.5)
        .map(|&(index, _)| index)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::candidate::Position;

    #[test]
    fn picks_best_pair_within_budget() {
        let candidates = vec![
            Candidate::new("a", Position::Defenseman, 5.0, 4.0),
            Candidate::new("b", Position::Defenseman, 4.0, 2.0),
            Candidate::new("c", Position::Defenseman, 3.0, 1.0),
            Candidate::new("x", Position::Goalie, 100.0, 1.0),
        ];
        let constraints = RosterConstraints::default()
            .with_quotas(0, 2, 0)
            .with_salary_cap(5.0);
        let mut picked = solve_assignment(&candidates, &constraints).unwrap();
        picked.sort_unstable();
        // a+b costs 6; a+c costs 5 (score 8) beats b+c (score 7).
        assert_eq!(picked, vec![0, 2]);
    }

    #[test]
    fn one_dollar_over_the_cap_is_not_selected() {
        let candidates = vec![
            Candidate::new("a", Position::Center, 5.0, 41_750_001.0),
            Candidate::new("b", Position::Center, 5.0, 41_749_999.0),
            Candidate::new("c", Position::Center, 1.0, 1.0),
        ];
        let constraints = RosterConstraints::default()
            .with_quotas(2, 0, 0)
            .with_salary_cap(83_499_999.0);
        let mut picked = solve_assignment(&candidates, &constraints).unwrap();
        picked.sort_unstable();
        // a+b scores 10 but costs 83,500,000.
        assert_eq!(picked, vec![1, 2]);
    }

    #[test]
    fn zero_quota_categories_get_no_variables() {
        let candidates = vec![Candidate::new("c", Position::Center, 1.0, 1.0)];
        let constraints = RosterConstraints::default().with_quotas(0, 0, 0);
        assert!(solve_assignment(&candidates, &constraints).unwrap().is_empty());
    }
}

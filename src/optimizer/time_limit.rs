//! Wall-clock limit around a blocking solve.
//!
//! The MILP backend has no native cancellation, so the solve runs on its own thread and the
//! caller stops waiting once the limit passes. An abandoned solve finishes in the background
//! and its result is dropped.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::optimizer::OptimizeError;

pub fn run_with_time_limit<T, F>(limit: Duration, solve: F) -> Result<T, OptimizeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, OptimizeError> + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("roster-solve".to_string())
        .spawn(move || {
            // Receiver may already be gone after a timeout.
            let _ = sender.send(solve());
        })
        .map_err(|err| OptimizeError::Solver(format!("failed to start solver thread: {err}")))?;

    match receiver.recv_timeout(limit) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(limit_secs = limit.as_secs_f64(), "roster solve exceeded time limit");
            Err(OptimizeError::Solver(format!(
                "time limit of {:.3}s expired before the solver finished",
                limit.as_secs_f64()
            )))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(OptimizeError::Solver(
            "solver thread exited without a result".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_result_when_solve_finishes_in_time() {
        let result = run_with_time_limit(Duration::from_secs(5), || Ok(42));
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn passes_through_solver_outcomes() {
        let result: Result<(), _> = run_with_time_limit(Duration::from_secs(5), || {
            Err(OptimizeError::Infeasible("none".to_string()))
        });
        assert_eq!(result, Err(OptimizeError::Infeasible("none".to_string())));
    }

    #[test]
    fn expiry_is_a_solver_error() {
        let result: Result<(), _> = run_with_time_limit(Duration::from_millis(20), || {
            thread::sleep(Duration::from_millis(500));
            Ok(())
        });
        let err = result.unwrap_err();
        assert_eq!(err.kind(), "solver_error");
        assert!(err.to_string().contains("time limit"));
    }

    #[test]
    fn panicking_solve_is_a_solver_error() {
        let result: Result<(), _> =
            run_with_time_limit(Duration::from_secs(5), || panic!("solver blew up"));
        assert_eq!(result.unwrap_err().kind(), "solver_error");
    }
}

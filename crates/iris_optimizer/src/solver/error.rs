use thiserror::Error;

use crate::solver::evaluator::ViolatedConstraint;

/// Failure of a single trajectory. The other trajectories are not affected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrajectoryError {
    #[error("trajectory {trajectory} panicked: {message}")]
    Panicked { trajectory: usize, message: String },

    #[error("trajectory {trajectory} produced an infeasible solution: {violations:?}")]
    InfeasibleSolution {
        trajectory: usize,
        violations: Vec<ViolatedConstraint>,
    },
}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("all {0} trajectories failed")]
    AllTrajectoriesFailed(usize),

    #[error("unable to start the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SolverError {
    /// Status code reported to the caller, every solver failure is an internal error.
    pub fn code(&self) -> i32 {
        match self {
            SolverError::AllTrajectoriesFailed(_) | SolverError::ThreadPool(_) => 1,
        }
    }
}

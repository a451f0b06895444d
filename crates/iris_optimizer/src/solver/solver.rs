use std::sync::Arc;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{info, instrument, warn};

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        accepted_solution::AcceptedSolution,
        error::SolverError,
        solver_params::SolverParams,
        trajectory::{TrajectoryOutcome, exploration_plan, run_trajectory},
    },
};

pub struct Solver {
    problem: Arc<VehicleRoutingProblem>,
    params: SolverParams,
}

impl Solver {
    pub fn new(problem: Arc<VehicleRoutingProblem>, params: SolverParams) -> Self {
        Solver { problem, params }
    }

    pub fn problem(&self) -> &Arc<VehicleRoutingProblem> {
        &self.problem
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Runs every trajectory of the exploration level on a dedicated pool and keeps the
    /// best solution. Fails only when no trajectory completed.
    #[instrument(skip_all, level = "info")]
    pub fn solve(&self) -> Result<AcceptedSolution, SolverError> {
        let threads = self.params.threads.number_of_threads();
        let plan = exploration_plan(
            &self.problem,
            self.params.exploration_level(),
            threads,
            self.params.seed,
            self.params.max_rounds(),
        );

        info!(
            trajectories = plan.len(),
            threads,
            exploration_level = self.params.exploration_level(),
            "Dispatching trajectories"
        );

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("iris-trajectory-{index}"))
            .build()?;

        let max_duration = self.params.max_duration();
        let debug_assertions = self.params.debug_options.run_assertions;

        // Indexed collect, the outcomes stay in dispatch order
        let outcomes = thread_pool.install(|| {
            plan.par_iter()
                .map(|params| run_trajectory(&self.problem, params, max_duration, debug_assertions))
                .collect::<Vec<_>>()
        });

        let best = select_best(outcomes).ok_or(SolverError::AllTrajectoriesFailed(plan.len()))?;

        info!(
            trajectory = best.trajectory,
            score = %best.score,
            "Best solution selected"
        );

        Ok(best)
    }
}

/// Fewest unassigned jobs first, then lowest cost. Equivalent scores keep the earliest
/// trajectory.
pub fn select_best(outcomes: Vec<TrajectoryOutcome>) -> Option<AcceptedSolution> {
    outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            TrajectoryOutcome::Completed(accepted) => Some(accepted),
            TrajectoryOutcome::Failed(error) => {
                warn!("{error}");
                None
            }
        })
        .fold(None, |best, candidate| match best {
            Some(best) if !candidate.score.is_better_than(&best.score) => Some(best),
            _ => Some(candidate),
        })
}

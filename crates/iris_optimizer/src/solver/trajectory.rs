use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use jiff::SignedDuration;
use tracing::{Level, debug, instrument};

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        accepted_solution::AcceptedSolution,
        construction::{
            construct_solution::construct_solution, construction_params::ConstructionParams,
        },
        error::TrajectoryError,
        evaluator::evaluate_solution,
        ls::{local_search::LocalSearch, neighborhood::NeighborhoodParams},
    },
    timer_debug,
    utils::time::Deadline,
};

pub const MAX_EXPLORATION_LEVEL: usize = 5;

/// Everything a trajectory needs, derived from its index only.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryParams {
    pub index: usize,
    pub depth: usize,
    pub construction: ConstructionParams,
    pub neighborhood: NeighborhoodParams,
}

pub enum TrajectoryOutcome {
    Completed(AcceptedSolution),
    Failed(TrajectoryError),
}

/// Neighborhood explored at `depth`, wider and longer for deeper trajectories.
pub fn neighborhood_for_depth(depth: usize, job_count: usize) -> NeighborhoodParams {
    let nearest_jobs = 8usize
        .saturating_mul(1 << depth.min(16))
        .min(job_count.saturating_sub(1))
        .max(1);

    NeighborhoodParams {
        nearest_jobs,
        max_or_opt_length: 2 + depth.min(1),
        max_rounds: 200 * (depth + 1),
    }
}

/// Trajectories run for `level`. Level 0 is a single deterministic trajectory, each
/// further level adds `threads` randomized trajectories, so the trajectories of a level
/// are always a subset of the ones of the next level.
pub fn exploration_plan(
    problem: &VehicleRoutingProblem,
    level: usize,
    threads: usize,
    base_seed: u64,
    max_rounds: Option<usize>,
) -> Vec<TrajectoryParams> {
    let level = level.min(MAX_EXPLORATION_LEVEL);
    let threads = threads.max(1);
    let job_count = problem.jobs().len();

    let count = if level == 0 { 1 } else { 1 + level * threads };

    (0..count)
        .map(|index| {
            let (depth, construction) = if index == 0 {
                (0, ConstructionParams::default())
            } else {
                (
                    1 + (index - 1) / threads,
                    ConstructionParams::from_table(
                        index - 1,
                        Some(base_seed.wrapping_add(index as u64)),
                    ),
                )
            };

            let mut neighborhood = neighborhood_for_depth(depth, job_count);
            if let Some(max_rounds) = max_rounds {
                neighborhood.max_rounds = neighborhood.max_rounds.min(max_rounds);
            }

            TrajectoryParams {
                index,
                depth,
                construction,
                neighborhood,
            }
        })
        .collect()
}

/// Runs construction then local search, isolating any failure to this trajectory.
pub fn run_trajectory(
    problem: &Arc<VehicleRoutingProblem>,
    params: &TrajectoryParams,
    max_duration: Option<SignedDuration>,
    debug_assertions: bool,
) -> TrajectoryOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| {
        solve_trajectory(problem, params, max_duration, debug_assertions)
    }));

    match result {
        Ok(Ok(solution)) => TrajectoryOutcome::Completed(solution),
        Ok(Err(error)) => TrajectoryOutcome::Failed(error),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|message| message.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| String::from("unknown panic"));

            TrajectoryOutcome::Failed(TrajectoryError::Panicked {
                trajectory: params.index,
                message,
            })
        }
    }
}

#[instrument(skip_all, fields(trajectory = params.index), level = Level::DEBUG)]
fn solve_trajectory(
    problem: &Arc<VehicleRoutingProblem>,
    params: &TrajectoryParams,
    max_duration: Option<SignedDuration>,
    debug_assertions: bool,
) -> Result<AcceptedSolution, TrajectoryError> {
    let deadline = Deadline::after(max_duration);

    let mut solution = timer_debug!(
        "Construction",
        construct_solution(problem, &params.construction)
    );
    let initial_score = solution.score();

    let mut local_search = LocalSearch::new(problem, &params.neighborhood, debug_assertions);
    let stats = timer_debug!("Local search", local_search.run(&mut solution, &deadline));

    let evaluation = evaluate_solution(&solution);

    if !evaluation.is_feasible() {
        return Err(TrajectoryError::InfeasibleSolution {
            trajectory: params.index,
            violations: evaluation
                .routes
                .iter()
                .flat_map(|route| route.violations.iter().copied())
                .collect(),
        });
    }

    let score = evaluation.score();

    debug!(
        depth = params.depth,
        %initial_score,
        %score,
        rounds = stats.rounds,
        applied_moves = stats.applied_moves,
        "Trajectory completed"
    );

    Ok(AcceptedSolution {
        solution,
        score,
        trajectory: params.index,
    })
}

use crate::{
    problem::job::JobIdx,
    solver::solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    utils::enumerate_idx::EnumerateIdx,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Insertion {
    pub route_id: RouteIdx,
    pub job_index: JobIdx,
    pub position: usize,
}

/// Why a job could not be placed anywhere in the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionOutcome {
    Inserted,
    /// No vehicle has the skills or the capacity for the job.
    NoCompatibleVehicle,
    /// Every position breaks a time window, the vehicle shift or reachability.
    NoFeasiblePosition,
}

pub fn for_each_insertion(
    solution: &WorkingSolution,
    job_index: JobIdx,
    mut f: impl FnMut(Insertion),
) {
    for (route_id, route) in solution.routes().iter().enumerate_idx::<RouteIdx>() {
        for position in 0..=route.len() {
            f(Insertion {
                route_id,
                job_index,
                position,
            });
        }
    }
}

/// Cheapest feasible insertion over every route. Ties go to the earliest route, then to
/// the earliest position.
pub fn find_best_insertion(
    solution: &WorkingSolution,
    job_index: JobIdx,
) -> Result<(f64, Insertion), InsertionOutcome> {
    let problem = solution.problem();
    let job = problem.job(job_index);

    let has_compatible_vehicle = solution.routes().iter().any(|route| {
        problem.is_job_compatible_with_vehicle(route.vehicle_id(), job_index)
            && job.demand().fits_in(route.vehicle(problem).capacity())
    });

    if !has_compatible_vehicle {
        return Err(InsertionOutcome::NoCompatibleVehicle);
    }

    solution
        .routes()
        .iter()
        .enumerate_idx()
        .filter_map(|(route_id, route): (RouteIdx, _)| {
            route
                .best_insertion(problem, job_index)
                .map(|(delta, position)| {
                    (
                        delta,
                        Insertion {
                            route_id,
                            job_index,
                            position,
                        },
                    )
                })
        })
        .fold(None, |best: Option<(f64, Insertion)>, candidate| match best {
            Some(best) if best.0 <= candidate.0 => Some(best),
            _ => Some(candidate),
        })
        .ok_or(InsertionOutcome::NoFeasiblePosition)
}

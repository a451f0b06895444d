use fxhash::FxHashSet;

use crate::{
    problem::{job::JobIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solver::solution::route::WorkingSolutionRoute,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborhoodParams {
    /// Number of nearest jobs a moved job may be placed next to.
    pub nearest_jobs: usize,
    pub max_or_opt_length: usize,
    pub max_rounds: usize,
}

impl Default for NeighborhoodParams {
    fn default() -> Self {
        NeighborhoodParams {
            nearest_jobs: 8,
            max_or_opt_length: 2,
            max_rounds: 200,
        }
    }
}

/// Granular neighborhood: a job is only moved next to one of its nearest jobs, or at
/// either end of a route.
pub struct Neighborhood {
    nearest: Vec<FxHashSet<JobIdx>>,
    max_or_opt_length: usize,
}

impl Neighborhood {
    pub fn new(problem: &VehicleRoutingProblem, params: &NeighborhoodParams) -> Self {
        let nearest = JobIdx::range(problem.jobs().len())
            .map(|job_id| {
                let nearest = problem.nearest_jobs(job_id);
                nearest[..params.nearest_jobs.min(nearest.len())]
                    .iter()
                    .copied()
                    .collect()
            })
            .collect();

        Neighborhood {
            nearest,
            max_or_opt_length: params.max_or_opt_length,
        }
    }

    pub fn max_or_opt_length(&self) -> usize {
        self.max_or_opt_length
    }

    #[inline]
    pub fn is_near(&self, job_id: JobIdx, other: JobIdx) -> bool {
        self.nearest[job_id.get()].contains(&other) || self.nearest[other.get()].contains(&job_id)
    }

    /// Whether `job_id` may be placed in the slot before `position` of `route`.
    #[inline]
    pub fn allows_insertion(
        &self,
        route: &WorkingSolutionRoute,
        job_id: JobIdx,
        position: usize,
    ) -> bool {
        if position == 0 || position >= route.len() {
            return true;
        }

        self.is_near(job_id, route.job_id(position - 1)) || self.is_near(job_id, route.job_id(position))
    }
}

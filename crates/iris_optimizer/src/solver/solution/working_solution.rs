use std::sync::Arc;

use fxhash::FxHashSet;

use crate::{
    problem::{job::JobIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solver::{
        insertion::Insertion,
        score::Score,
        solution::{route::WorkingSolutionRoute, route_id::RouteIdx},
    },
    utils::enumerate_idx::EnumerateIdx,
};

#[derive(Clone)]
pub struct WorkingSolution {
    problem: Arc<VehicleRoutingProblem>,
    routes: Vec<WorkingSolutionRoute>,
    unassigned_jobs: FxHashSet<JobIdx>,
}

impl WorkingSolution {
    pub fn new(problem: Arc<VehicleRoutingProblem>) -> Self {
        let routes = problem
            .vehicles()
            .iter()
            .enumerate_idx()
            .map(|(vehicle_id, _)| WorkingSolutionRoute::empty(&problem, vehicle_id))
            .collect::<Vec<_>>();
        let unassigned_jobs = JobIdx::range(problem.jobs().len()).collect();

        WorkingSolution {
            problem,
            routes,
            unassigned_jobs,
        }
    }

    pub fn problem(&self) -> &VehicleRoutingProblem {
        &self.problem
    }

    pub fn problem_arc(&self) -> &Arc<VehicleRoutingProblem> {
        &self.problem
    }

    pub fn routes(&self) -> &[WorkingSolutionRoute] {
        &self.routes
    }

    pub fn route(&self, route_id: RouteIdx) -> &WorkingSolutionRoute {
        &self.routes[route_id]
    }

    pub fn route_mut(&mut self, route_id: RouteIdx) -> &mut WorkingSolutionRoute {
        &mut self.routes[route_id]
    }

    pub fn non_empty_routes_iter(&self) -> impl Iterator<Item = &WorkingSolutionRoute> {
        self.routes.iter().filter(|route| !route.is_empty())
    }

    pub fn has_unassigned(&self) -> bool {
        !self.unassigned_jobs.is_empty()
    }

    pub fn is_unassigned(&self, job_id: JobIdx) -> bool {
        self.unassigned_jobs.contains(&job_id)
    }

    pub fn unassigned_jobs(&self) -> &FxHashSet<JobIdx> {
        &self.unassigned_jobs
    }

    /// Unassigned jobs in index order.
    pub fn sorted_unassigned_jobs(&self) -> Vec<JobIdx> {
        let mut jobs = self.unassigned_jobs.iter().copied().collect::<Vec<_>>();
        jobs.sort_unstable();
        jobs
    }

    pub fn total_cost(&self) -> f64 {
        self.routes.iter().map(WorkingSolutionRoute::cost).sum()
    }

    pub fn score(&self) -> Score {
        Score::new(self.unassigned_jobs.len(), self.total_cost())
    }

    /// Routes with the same vehicles visiting the same jobs in the same order.
    pub fn is_identical(&self, other: &WorkingSolution) -> bool {
        self.routes.len() == other.routes.len()
            && self
                .routes
                .iter()
                .zip(&other.routes)
                .all(|(route, other_route)| {
                    route.vehicle_id() == other_route.vehicle_id()
                        && route.job_ids() == other_route.job_ids()
                })
    }

    pub fn insert(&mut self, insertion: &Insertion) {
        let route = &mut self.routes[insertion.route_id];
        route.insert_job(&self.problem, insertion.job_index, insertion.position);
        self.unassigned_jobs.remove(&insertion.job_index);
    }

    /// Puts an assigned job back into the unassigned set.
    pub fn remove_job(&mut self, route_id: RouteIdx, position: usize) -> JobIdx {
        let job_id = self.routes[route_id].remove_job(&self.problem, position);
        self.unassigned_jobs.insert(job_id);
        job_id
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        problem::job::JobIdx,
        solver::{insertion::Insertion, solution::route_id::RouteIdx},
        test_utils::{self, TestRoute},
    };

    use super::WorkingSolution;

    #[test]
    fn test_insert_and_remove_keep_partition() {
        let jobs = test_utils::create_basic_jobs(vec![1, 2, 3]);
        let vehicles = test_utils::create_basic_vehicles(vec![0, 0]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::line_matrix(4),
            jobs,
            vehicles,
        ));

        let mut solution = WorkingSolution::new(Arc::clone(&problem));
        assert_eq!(solution.score().unassigned, 3);
        assert_eq!(solution.total_cost(), 0.0);

        solution.insert(&Insertion {
            route_id: RouteIdx::new(1),
            job_index: JobIdx::new(2),
            position: 0,
        });

        assert!(!solution.is_unassigned(JobIdx::new(2)));
        assert_eq!(solution.score().unassigned, 2);
        assert_eq!(solution.total_cost(), 6.0);

        let job_id = solution.remove_job(RouteIdx::new(1), 0);
        assert_eq!(job_id, JobIdx::new(2));
        assert_eq!(solution.sorted_unassigned_jobs().len(), 3);
        assert_eq!(solution.total_cost(), 0.0);
    }

    #[test]
    fn test_is_identical() {
        let jobs = test_utils::create_basic_jobs(vec![1, 2, 3]);
        let vehicles = test_utils::create_basic_vehicles(vec![0]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::line_matrix(4),
            jobs,
            vehicles,
        ));

        let a = test_utils::create_test_working_solution(
            Arc::clone(&problem),
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![0, 1, 2],
            }],
        );
        let b = test_utils::create_test_working_solution(
            Arc::clone(&problem),
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![0, 2, 1],
            }],
        );

        assert!(a.is_identical(&a.clone()));
        assert!(!a.is_identical(&b));
    }
}

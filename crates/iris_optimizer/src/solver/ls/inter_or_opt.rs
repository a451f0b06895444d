use std::ops::ControlFlow;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        ls::{r#move::LocalSearchOperator, neighborhood::Neighborhood},
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

/// **Inter-Route Or-Opt**
///
/// Moves a segment of consecutive jobs from one route to another.
///
/// ```text
/// BEFORE:
///    Route 1: ... (A) -> [B -> C] -> (D) -> (E) ...
///                        <─ seg ─>
///    Route 2: ... (X) -> (Y) -> (Z) ...
///
/// AFTER:
///    Route 1: ... (A) -> (D) -> (E) ...
///
///    Route 2: ... (X) -> [B -> C] -> (Y) -> (Z) ...
///                        <─ seg ─>
/// ```
#[derive(Debug)]
pub struct InterOrOptOperator {
    params: InterOrOptParams,
}

#[derive(Debug)]
pub struct InterOrOptParams {
    pub from_route_id: RouteIdx,
    pub to_route_id: RouteIdx,
    pub segment_start: usize,
    pub segment_length: usize,

    /// Second route position
    pub to: usize,
}

impl InterOrOptOperator {
    pub fn new(params: InterOrOptParams) -> Self {
        if params.segment_length < 2 {
            panic!("InterOrOpt: 'segment_length' must be at least 2.");
        }

        if params.from_route_id == params.to_route_id {
            panic!("InterOrOpt: routes must be different");
        }

        InterOrOptOperator { params }
    }

    fn segment_end(&self) -> usize {
        self.params.segment_start + self.params.segment_length
    }
}

impl LocalSearchOperator for InterOrOptOperator {
    fn generate_moves<C>(
        problem: &VehicleRoutingProblem,
        solution: &WorkingSolution,
        neighborhood: &Neighborhood,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) -> ControlFlow<()>
    where
        C: FnMut(Self) -> ControlFlow<()>,
    {
        if r1 == r2 {
            return ControlFlow::Continue(());
        }

        let from_route = solution.route(r1);
        let to_route = solution.route(r2);
        let capacity = to_route.vehicle(problem).capacity();

        for segment_length in 2..=neighborhood.max_or_opt_length() {
            if segment_length > from_route.len() {
                break;
            }

            for segment_start in 0..=(from_route.len() - segment_length) {
                let segment = from_route.job_ids_iter(segment_start, segment_start + segment_length);

                if !segment
                    .clone()
                    .all(|job_id| problem.is_job_compatible_with_vehicle(to_route.vehicle_id(), job_id))
                {
                    continue;
                }

                let mut load = to_route.load().clone();
                for job_id in segment {
                    load += problem.job(job_id).demand();
                }

                if !load.fits_in(capacity) {
                    continue;
                }

                let head = from_route.job_id(segment_start);

                for to in 0..=to_route.len() {
                    if !neighborhood.allows_insertion(to_route, head, to) {
                        continue;
                    }

                    consumer(InterOrOptOperator::new(InterOrOptParams {
                        from_route_id: r1,
                        to_route_id: r2,
                        segment_start,
                        segment_length,
                        to,
                    }))?;
                }
            }
        }

        ControlFlow::Continue(())
    }

    fn delta(&self, solution: &WorkingSolution) -> f64 {
        let problem = solution.problem();
        let r1 = solution.route(self.params.from_route_id);
        let r2 = solution.route(self.params.to_route_id);

        let segment = r1.job_ids_iter(self.params.segment_start, self.segment_end());

        r1.replace_cost_delta(
            problem,
            std::iter::empty(),
            self.params.segment_start,
            self.segment_end(),
        ) + r2.replace_cost_delta(problem, segment, self.params.to, self.params.to)
    }

    fn is_valid(&self, solution: &WorkingSolution) -> bool {
        let problem = solution.problem();
        let r1 = solution.route(self.params.from_route_id);
        let r2 = solution.route(self.params.to_route_id);

        let segment = r1.job_ids_iter(self.params.segment_start, self.segment_end());

        r2.is_valid_change(problem, segment, self.params.to, self.params.to)
            && r1.is_valid_tw_change(
                problem,
                std::iter::empty(),
                self.params.segment_start,
                self.segment_end(),
            )
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut WorkingSolution) {
        let job_ids = solution
            .route(self.params.from_route_id)
            .job_ids_iter(self.params.segment_start, self.segment_end())
            .collect::<Vec<_>>();

        solution.route_mut(self.params.from_route_id).replace_jobs(
            problem,
            &[],
            self.params.segment_start,
            self.segment_end(),
        );
        solution.route_mut(self.params.to_route_id).replace_jobs(
            problem,
            &job_ids,
            self.params.to,
            self.params.to,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.params.from_route_id, self.params.to_route_id]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        solver::{
            ls::{
                inter_or_opt::{InterOrOptOperator, InterOrOptParams},
                r#move::LocalSearchOperator,
            },
            solution::route_id::RouteIdx,
        },
        test_utils::{self, TestRoute},
    };

    #[test]
    fn test_inter_or_opt() {
        let jobs = test_utils::create_basic_jobs(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let vehicles = test_utils::create_basic_vehicles(vec![0, 0]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::asymmetric_grid_matrix(3, 3),
            jobs,
            vehicles,
        ));

        let mut solution = test_utils::create_test_working_solution(
            Arc::clone(&problem),
            vec![
                TestRoute {
                    vehicle_id: 0,
                    job_ids: vec![0, 1, 2, 3],
                },
                TestRoute {
                    vehicle_id: 1,
                    job_ids: vec![4, 5, 6, 7],
                },
            ],
        );

        let operator = InterOrOptOperator::new(InterOrOptParams {
            from_route_id: RouteIdx::new(0),
            to_route_id: RouteIdx::new(1),
            segment_start: 1,
            segment_length: 2,
            to: 2,
        });

        let cost = solution.total_cost();
        let delta = operator.delta(&solution);
        assert!(operator.is_valid(&solution));
        operator.apply(&problem, &mut solution);

        assert!((solution.total_cost() - (cost + delta)).abs() < 1e-9);
        assert_eq!(test_utils::route_job_ids(&solution, 0), vec![0, 3]);
        assert_eq!(
            test_utils::route_job_ids(&solution, 1),
            vec![4, 5, 1, 2, 6, 7]
        );
    }

    #[test]
    fn test_inter_or_opt_whole_route() {
        let jobs = test_utils::create_basic_jobs(vec![3, 4, 1, 2]);
        let vehicles = test_utils::create_basic_vehicles(vec![0, 0]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::line_matrix(5),
            jobs,
            vehicles,
        ));

        let mut solution = test_utils::create_test_working_solution(
            Arc::clone(&problem),
            vec![
                TestRoute {
                    vehicle_id: 0,
                    job_ids: vec![0, 1],
                },
                TestRoute {
                    vehicle_id: 1,
                    job_ids: vec![2, 3],
                },
            ],
        );

        let operator = InterOrOptOperator::new(InterOrOptParams {
            from_route_id: RouteIdx::new(0),
            to_route_id: RouteIdx::new(1),
            segment_start: 0,
            segment_length: 2,
            to: 2,
        });

        // Route 1 drops 0 -> 3 -> 4 -> 0, route 2 extends 0 -> 1 -> 2 -> 0 up to 4
        assert_eq!(operator.delta(&solution), -8.0 + 4.0);

        let cost = solution.total_cost();
        operator.apply(&problem, &mut solution);
        assert_eq!(solution.total_cost(), cost - 4.0);
        assert!(solution.route(RouteIdx::new(0)).is_empty());
        assert_eq!(test_utils::route_job_ids(&solution, 1), vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_inter_or_opt_respects_capacity() {
        let jobs = test_utils::create_jobs_with_demand(vec![1, 2, 3], 2.0);
        let vehicles = test_utils::create_vehicles_with_capacity(vec![0, 0], 4.0);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::line_matrix(4),
            jobs,
            vehicles,
        ));

        let solution = test_utils::create_test_working_solution(
            Arc::clone(&problem),
            vec![
                TestRoute {
                    vehicle_id: 0,
                    job_ids: vec![0, 1],
                },
                TestRoute {
                    vehicle_id: 1,
                    job_ids: vec![2],
                },
            ],
        );

        let operator = InterOrOptOperator::new(InterOrOptParams {
            from_route_id: RouteIdx::new(0),
            to_route_id: RouteIdx::new(1),
            segment_start: 0,
            segment_length: 2,
            to: 0,
        });

        assert!(!operator.is_valid(&solution));
    }
}

use std::ops::ControlFlow;

use crate::{
    problem::{job::JobIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solver::{
        ls::{r#move::LocalSearchOperator, neighborhood::Neighborhood},
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

/// **Intra-Route Swap**
///
/// Exchanges the positions of two jobs (`first` and `second`) within the same route.
///
/// ```text
/// BEFORE:
///    ... (A) -> [first] -> (B) ... (X) -> [second] -> (D) ...
///
/// AFTER:
///    ... (A) -> [second] -> (B) ... (X) -> [first] -> (D) ...
///
/// Edges Removed: (A->first), (first->B), (X->second), (second->D)
/// Edges Created: (A->second), (second->B), (X->first), (first->D)
/// ```
///
/// When both jobs are adjacent, `B` is `second` and `X` is `first`.
#[derive(Debug)]
pub struct SwapOperator {
    params: SwapOperatorParams,
}

#[derive(Debug)]
pub struct SwapOperatorParams {
    pub route_id: RouteIdx,
    pub first: usize,
    pub second: usize,
}

impl SwapOperator {
    pub fn new(params: SwapOperatorParams) -> Self {
        if params.first >= params.second {
            panic!("SwapOperator: first must be before second");
        }

        Self { params }
    }

    fn new_job_ids(&self, solution: &WorkingSolution) -> Vec<JobIdx> {
        let route = solution.route(self.params.route_id);
        let (first, second) = (self.params.first, self.params.second);

        std::iter::once(route.job_id(second))
            .chain(route.job_ids_iter(first + 1, second))
            .chain(std::iter::once(route.job_id(first)))
            .collect()
    }
}

impl LocalSearchOperator for SwapOperator {
    fn generate_moves<C>(
        _problem: &VehicleRoutingProblem,
        solution: &WorkingSolution,
        neighborhood: &Neighborhood,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) -> ControlFlow<()>
    where
        C: FnMut(Self) -> ControlFlow<()>,
    {
        if r1 != r2 {
            return ControlFlow::Continue(());
        }

        let route = solution.route(r1);

        for first in 0..route.len() {
            for second in (first + 1)..route.len() {
                // The first job lands in the slot of the second one and vice versa
                if !neighborhood.allows_insertion(route, route.job_id(first), second + 1)
                    && !neighborhood.allows_insertion(route, route.job_id(second), first)
                {
                    continue;
                }

                consumer(SwapOperator::new(SwapOperatorParams {
                    route_id: r1,
                    first,
                    second,
                }))?;
            }
        }

        ControlFlow::Continue(())
    }

    fn delta(&self, solution: &WorkingSolution) -> f64 {
        let problem = solution.problem();
        let route = solution.route(self.params.route_id);
        let (first_pos, second_pos) = (self.params.first, self.params.second);

        let a = route.previous_location_id(problem, first_pos);
        let first = Some(route.location_id(problem, first_pos));
        let second = Some(route.location_id(problem, second_pos));
        let d = route.location_id_or_end(problem, second_pos + 1);

        if first_pos + 1 == second_pos {
            let current_cost = problem.travel_cost_or_zero(a, first)
                + problem.travel_cost_or_zero(first, second)
                + problem.travel_cost_or_zero(second, d);

            let new_cost = problem.travel_cost_or_zero(a, second)
                + problem.travel_cost_or_zero(second, first)
                + problem.travel_cost_or_zero(first, d);

            return new_cost - current_cost;
        }

        let b = Some(route.location_id(problem, first_pos + 1));
        let x = Some(route.location_id(problem, second_pos - 1));

        let current_cost = problem.travel_cost_or_zero(a, first)
            + problem.travel_cost_or_zero(first, b)
            + problem.travel_cost_or_zero(x, second)
            + problem.travel_cost_or_zero(second, d);

        let new_cost = problem.travel_cost_or_zero(a, second)
            + problem.travel_cost_or_zero(second, b)
            + problem.travel_cost_or_zero(x, first)
            + problem.travel_cost_or_zero(first, d);

        new_cost - current_cost
    }

    fn is_valid(&self, solution: &WorkingSolution) -> bool {
        let route = solution.route(self.params.route_id);
        let job_ids = self.new_job_ids(solution);

        route.is_valid_tw_change(
            solution.problem(),
            job_ids.into_iter(),
            self.params.first,
            self.params.second + 1,
        )
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut WorkingSolution) {
        let job_ids = self.new_job_ids(solution);

        solution.route_mut(self.params.route_id).replace_jobs(
            problem,
            &job_ids,
            self.params.first,
            self.params.second + 1,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.params.route_id]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        solver::{
            ls::{
                r#move::LocalSearchOperator,
                swap::{SwapOperator, SwapOperatorParams},
            },
            solution::route_id::RouteIdx,
        },
        test_utils::{self, TestRoute},
    };

    #[test]
    fn test_swap() {
        let jobs = test_utils::create_basic_jobs(vec![1, 2, 3, 4, 5, 6]);
        let vehicles = test_utils::create_basic_vehicles(vec![0]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::asymmetric_grid_matrix(3, 3),
            jobs,
            vehicles,
        ));

        let mut solution = test_utils::create_test_working_solution(
            Arc::clone(&problem),
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![0, 1, 2, 3, 4, 5],
            }],
        );

        let operator = SwapOperator::new(SwapOperatorParams {
            route_id: RouteIdx::new(0),
            first: 1,
            second: 4,
        });

        let cost = solution.total_cost();
        let delta = operator.delta(&solution);
        operator.apply(&problem, &mut solution);

        assert!((solution.total_cost() - (cost + delta)).abs() < 1e-9);
        assert_eq!(
            test_utils::route_job_ids(&solution, 0),
            vec![0, 4, 2, 3, 1, 5]
        );
    }

    #[test]
    fn test_swap_adjacent_at_route_end() {
        let jobs = test_utils::create_basic_jobs(vec![1, 2, 3, 4]);
        let vehicles = test_utils::create_basic_vehicles(vec![0]);
        let problem = Arc::new(test_utils::create_test_problem(
            test_utils::asymmetric_grid_matrix(3, 3),
            jobs,
            vehicles,
        ));

        let mut solution = test_utils::create_test_working_solution(
            Arc::clone(&problem),
            vec![TestRoute {
                vehicle_id: 0,
                job_ids: vec![0, 1, 2, 3],
            }],
        );

        let operator = SwapOperator::new(SwapOperatorParams {
            route_id: RouteIdx::new(0),
            first: 2,
            second: 3,
        });

        let cost = solution.total_cost();
        let delta = operator.delta(&solution);
        operator.apply(&problem, &mut solution);

        assert!((solution.total_cost() - (cost + delta)).abs() < 1e-9);
        assert_eq!(test_utils::route_job_ids(&solution, 0), vec![0, 1, 3, 2]);
    }
}

use std::ops::ControlFlow;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        ls::{r#move::LocalSearchOperator, neighborhood::Neighborhood},
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

/// **Inter-Route Swap**
///
/// Exchanges a job from one route with a job from another route.
///
/// ```text
/// BEFORE:
///    Route 1: ... (A) -> [first] -> (B) ...
///    Route 2: ... (X) -> [second] -> (Y) ...
///
/// AFTER:
///    Route 1: ... (A) -> [second] -> (B) ...
///    Route 2: ... (X) -> [first] -> (Y) ...
/// ```
#[derive(Debug)]
pub struct InterSwapOperator {
    params: InterSwapOperatorParams,
}

#[derive(Debug)]
pub struct InterSwapOperatorParams {
    pub first_route_id: RouteIdx,
    pub second_route_id: RouteIdx,
    pub first: usize,
    pub second: usize,
}

impl InterSwapOperator {
    pub fn new(params: InterSwapOperatorParams) -> Self {
        if params.first_route_id == params.second_route_id {
            panic!("InterSwapOperator: routes must be different");
        }

        Self { params }
    }
}

impl LocalSearchOperator for InterSwapOperator {
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
        // Each pair of routes is explored once
        if r1 >= r2 {
            return ControlFlow::Continue(());
        }

        let first_route = solution.route(r1);
        let second_route = solution.route(r2);

        for first in 0..first_route.len() {
            let first_job_id = first_route.job_id(first);

            if !problem.is_job_compatible_with_vehicle(second_route.vehicle_id(), first_job_id) {
                continue;
            }

            for second in 0..second_route.len() {
                let second_job_id = second_route.job_id(second);

                if !problem.is_job_compatible_with_vehicle(first_route.vehicle_id(), second_job_id)
                {
                    continue;
                }

                if !neighborhood.allows_insertion(second_route, first_job_id, second)
                    && !neighborhood.allows_insertion(first_route, second_job_id, first)
                {
                    continue;
                }

                consumer(InterSwapOperator::new(InterSwapOperatorParams {
                    first_route_id: r1,
                    second_route_id: r2,
                    first,
                    second,
                }))?;
            }
        }

        ControlFlow::Continue(())
    }

    fn delta(&self, solution: &WorkingSolution) -> f64 {
        let problem = solution.problem();
        let first_route = solution.route(self.params.first_route_id);
        let second_route = solution.route(self.params.second_route_id);

        let first_job_id = first_route.job_id(self.params.first);
        let second_job_id = second_route.job_id(self.params.second);

        first_route.replace_cost_delta(
            problem,
            std::iter::once(second_job_id),
            self.params.first,
            self.params.first + 1,
        ) + second_route.replace_cost_delta(
            problem,
            std::iter::once(first_job_id),
            self.params.second,
            self.params.second + 1,
        )
    }

    fn is_valid(&self, solution: &WorkingSolution) -> bool {
        let problem = solution.problem();
        let first_route = solution.route(self.params.first_route_id);
        let second_route = solution.route(self.params.second_route_id);

        let first_job_id = first_route.job_id(self.params.first);
        let second_job_id = second_route.job_id(self.params.second);

        first_route.is_valid_change(
            problem,
            std::iter::once(second_job_id),
            self.params.first,
            self.params.first + 1,
        ) && second_route.is_valid_change(
            problem,
            std::iter::once(first_job_id),
            self.params.second,
            self.params.second + 1,
        )
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut WorkingSolution) {
        let first_job_id = solution
            .route(self.params.first_route_id)
            .job_id(self.params.first);
        let second_job_id = solution
            .route(self.params.second_route_id)
            .job_id(self.params.second);

        solution.route_mut(self.params.first_route_id).replace_jobs(
            problem,
            &[second_job_id],
            self.params.first,
            self.params.first + 1,
        );
        solution.route_mut(self.params.second_route_id).replace_jobs(
            problem,
            &[first_job_id],
            self.params.second,
            self.params.second + 1,
        );
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.params.first_route_id, self.params.second_route_id]
    }
}

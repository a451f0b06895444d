use std::ops::ControlFlow;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        ls::{r#move::LocalSearchOperator, neighborhood::Neighborhood},
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

/// **Inter-Route Relocate**
///
/// Moves a job from one route (`from_route_id`) to a specific position in another
/// route (`to_route_id`).
///
/// ```text
/// BEFORE:
///    Route 1: ... (A) -> [from] -> (C) ...
///    Route 2: ... (X) -> (Y) ...
///
/// AFTER:
///    Route 1: ... (A) -> (C) ...
///    Route 2: ... (X) -> [from] -> (Y) ...
///
/// Edges Removed: (A->from), (from->C), (X->Y)
/// Edges Created: (A->C),    (X->from), (from->Y)
/// ```
#[derive(Debug)]
pub struct InterRelocateOperator {
    params: InterRelocateParams,
}

#[derive(Debug)]
pub struct InterRelocateParams {
    pub from_route_id: RouteIdx,
    pub to_route_id: RouteIdx,
    pub from: usize,
    pub to: usize,
}

impl InterRelocateOperator {
    pub fn new(params: InterRelocateParams) -> Self {
        if params.from_route_id == params.to_route_id {
            panic!("Cannot use InterRelocate on the same route");
        }

        Self { params }
    }
}

impl LocalSearchOperator for InterRelocateOperator {
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

        for from in 0..from_route.len() {
            let job_id = from_route.job_id(from);

            if !problem.is_job_compatible_with_vehicle(to_route.vehicle_id(), job_id)
                || !to_route
                    .load()
                    .fits_with(problem.job(job_id).demand(), capacity)
            {
                continue;
            }

            for to in 0..=to_route.len() {
                if !neighborhood.allows_insertion(to_route, job_id, to) {
                    continue;
                }

                consumer(InterRelocateOperator::new(InterRelocateParams {
                    from_route_id: r1,
                    to_route_id: r2,
                    from,
                    to,
                }))?;
            }
        }

        ControlFlow::Continue(())
    }

    fn delta(&self, solution: &WorkingSolution) -> f64 {
        let problem = solution.problem();
        let from_route = solution.route(self.params.from_route_id);
        let to_route = solution.route(self.params.to_route_id);
        let job_id = from_route.job_id(self.params.from);

        from_route.removal_cost_delta(problem, self.params.from)
            + to_route.insertion_cost_delta(problem, job_id, self.params.to)
    }

    fn is_valid(&self, solution: &WorkingSolution) -> bool {
        let problem = solution.problem();
        let from_route = solution.route(self.params.from_route_id);
        let to_route = solution.route(self.params.to_route_id);
        let job_id = from_route.job_id(self.params.from);

        to_route.can_insert(problem, job_id, self.params.to)
            && from_route.is_valid_change(
                problem,
                std::iter::empty(),
                self.params.from,
                self.params.from + 1,
            )
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut WorkingSolution) {
        let job_id = solution
            .route_mut(self.params.from_route_id)
            .remove_job(problem, self.params.from);

        solution
            .route_mut(self.params.to_route_id)
            .insert_job(problem, job_id, self.params.to);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.params.from_route_id, self.params.to_route_id]
    }
}

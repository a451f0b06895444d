use std::ops::ControlFlow;

use crate::{
    problem::{job::JobIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solver::{
        ls::{r#move::LocalSearchOperator, neighborhood::Neighborhood},
        solution::{
            route::WorkingSolutionRoute, route_id::RouteIdx, working_solution::WorkingSolution,
        },
    },
};

/// **Intra-Route Or-Opt**
///
/// Moves a consecutive chain of jobs of length `segment_length` starting at `from`
/// to a new position `to`.
///
/// ```text
/// BEFORE:
///    ... (A) -> [from -> ... -> end] -> (B) ... (X) -> (Y) ...
///                  ^             ^
///              Start Chain   End Chain
///
/// AFTER:
///    ... (A) -> (B) ... (X) -> [from -> ... -> end] -> (Y) ...
///
/// Edges Removed: (A->from), (end->B), (X->Y)
/// Edges Created: (A->B),    (X->from), (end->Y)
/// ```
#[derive(Debug)]
pub struct OrOptOperator {
    params: OrOptOperatorParams,
}

#[derive(Debug)]
pub struct OrOptOperatorParams {
    pub route_id: RouteIdx,
    pub from: usize,
    pub to: usize,
    pub segment_length: usize,
}

impl OrOptOperator {
    pub fn new(params: OrOptOperatorParams) -> Self {
        if params.segment_length < 2 {
            panic!("OrOptOperator: 'segment_length' must be at least 2.");
        }

        if params.to >= params.from && params.to <= params.from + params.segment_length {
            panic!("OrOptOperator: Overlapping segments are not allowed.");
        }

        OrOptOperator { params }
    }

    fn segment_end(&self) -> usize {
        self.params.from + self.params.segment_length
    }

    /// Jobs of the rewritten range, in their new order.
    fn moved_jobs<'a>(
        &'a self,
        route: &'a WorkingSolutionRoute,
    ) -> impl Iterator<Item = JobIdx> + Clone + 'a {
        let chain = route.job_ids_iter(self.params.from, self.segment_end());

        let (first, second) = if self.params.from < self.params.to {
            (route.job_ids_iter(self.segment_end(), self.params.to), chain)
        } else {
            (chain, route.job_ids_iter(self.params.to, self.params.from))
        };

        first.chain(second)
    }

    /// Range `[start, end)` of the route rewritten by the move.
    fn changed_range(&self) -> (usize, usize) {
        if self.params.from < self.params.to {
            (self.params.from, self.params.to)
        } else {
            (self.params.to, self.segment_end())
        }
    }
}

impl LocalSearchOperator for OrOptOperator {
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

        for segment_length in 2..=neighborhood.max_or_opt_length() {
            if segment_length >= route.len() {
                break;
            }

            for from in 0..=(route.len() - segment_length) {
                let head = route.job_id(from);

                for to in 0..=route.len() {
                    if to >= from && to <= from + segment_length {
                        continue;
                    }

                    if !neighborhood.allows_insertion(route, head, to) {
                        continue;
                    }

                    consumer(OrOptOperator::new(OrOptOperatorParams {
                        route_id: r1,
                        from,
                        to,
                        segment_length,
                    }))?;
                }
            }
        }

        ControlFlow::Continue(())
    }

    fn delta(&self, solution: &WorkingSolution) -> f64 {
        let problem = solution.problem();
        let route = solution.route(self.params.route_id);

        let a = route.previous_location_id(problem, self.params.from);
        let from = Some(route.location_id(problem, self.params.from));
        let end = Some(route.location_id(problem, self.segment_end() - 1));
        let b = route.location_id_or_end(problem, self.segment_end());

        let x = route.previous_location_id(problem, self.params.to);
        let y = route.location_id_or_end(problem, self.params.to);

        let current_cost = problem.travel_cost_or_zero(a, from)
            + problem.travel_cost_or_zero(end, b)
            + problem.travel_cost_or_zero(x, y);

        let new_cost = problem.travel_cost_or_zero(a, b)
            + problem.travel_cost_or_zero(x, from)
            + problem.travel_cost_or_zero(end, y);

        new_cost - current_cost
    }

    fn is_valid(&self, solution: &WorkingSolution) -> bool {
        let route = solution.route(self.params.route_id);
        let (start, end) = self.changed_range();

        route.is_valid_tw_change(solution.problem(), self.moved_jobs(route), start, end)
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut WorkingSolution) {
        let route = solution.route_mut(self.params.route_id);
        let (start, end) = self.changed_range();
        let job_ids = self.moved_jobs(route).collect::<Vec<_>>();

        route.replace_jobs(problem, &job_ids, start, end);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.params.route_id]
    }
}

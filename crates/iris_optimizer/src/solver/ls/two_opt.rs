use std::ops::ControlFlow;

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        ls::{r#move::LocalSearchOperator, neighborhood::Neighborhood},
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

/// **Intra-Route 2-Opt**
///
/// Reverses the sequence of jobs between `from` and `to` (inclusive).
/// This eliminates crossing edges within a single route.
///
/// ```text
/// BEFORE:
///    ... (prev) --x--> [from] -> ... -> [to] --x--> (next) ...
///          ^             ^               ^            ^
///          A             B               C            D
///
/// AFTER (Sequence Reversed):
///    ... (prev) -----> [to] -> ... -> [from] -----> (next) ...
///          ^             ^               ^            ^
///          A             C               B            D
///
/// Edges Removed: (prev->from), (to->next)
/// Edges Added:   (prev->to),   (from->next)
/// ```
#[derive(Debug)]
pub struct TwoOptOperator {
    params: TwoOptParams,
}

#[derive(Debug)]
pub struct TwoOptParams {
    pub route_id: RouteIdx,
    pub from: usize,
    pub to: usize,
}

impl TwoOptOperator {
    pub fn new(params: TwoOptParams) -> Self {
        if params.from >= params.to {
            panic!("TwoOpt: cannot have from >= to")
        }

        TwoOptOperator { params }
    }

    fn symmetric_delta(&self, solution: &WorkingSolution) -> f64 {
        let problem = solution.problem();
        let route = solution.route(self.params.route_id);

        let prev = route.previous_location_id(problem, self.params.from);
        let from = Some(route.location_id(problem, self.params.from));

        let to = Some(route.location_id(problem, self.params.to));
        let next = route.location_id_or_end(problem, self.params.to + 1);

        let current_cost =
            problem.travel_cost_or_zero(prev, from) + problem.travel_cost_or_zero(to, next);

        let new_cost = problem.travel_cost_or_zero(prev, to) + problem.travel_cost_or_zero(from, next);

        new_cost - current_cost
    }

    /// The reversed segment is priced with the cumulated backward costs of the route.
    fn asymmetric_delta(&self, solution: &WorkingSolution) -> f64 {
        let problem = solution.problem();
        let route = solution.route(self.params.route_id);
        let (start, end) = (self.params.from, self.params.to + 1);

        let segment_delta = route.reversed_segment_cost(problem, start, end)
            - route.segment_cost(problem, start, end);

        self.symmetric_delta(solution) + segment_delta
    }
}

impl LocalSearchOperator for TwoOptOperator {
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

        if route.len() < 3 {
            return ControlFlow::Continue(()); // a reversal of two jobs is a swap
        }

        for from in 0..route.len() - 2 {
            for to in (from + 2)..route.len() {
                // After the reversal, `to` follows the job before `from`
                if from > 0 && !neighborhood.allows_insertion(route, route.job_id(to), from) {
                    continue;
                }

                consumer(TwoOptOperator::new(TwoOptParams {
                    route_id: r1,
                    from,
                    to,
                }))?;
            }
        }

        ControlFlow::Continue(())
    }

    fn delta(&self, solution: &WorkingSolution) -> f64 {
        if solution.problem().is_symmetric() {
            self.symmetric_delta(solution)
        } else {
            self.asymmetric_delta(solution)
        }
    }

    fn is_valid(&self, solution: &WorkingSolution) -> bool {
        let route = solution.route(self.params.route_id);

        route.is_valid_tw_change(
            solution.problem(),
            route
                .job_ids_iter(self.params.from, self.params.to + 1)
                .rev(),
            self.params.from,
            self.params.to + 1,
        )
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut WorkingSolution) {
        let route = solution.route_mut(self.params.route_id);
        let job_ids = route
            .job_ids_iter(self.params.from, self.params.to + 1)
            .rev()
            .collect::<Vec<_>>();
        route.replace_jobs(problem, &job_ids, self.params.from, self.params.to + 1);
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.params.route_id]
    }
}

use std::ops::ControlFlow;

use tracing::{Level, instrument};

use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        ls::{r#move::LocalSearchOperator, neighborhood::Neighborhood},
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

/// **Intra-Route Relocate**
///
/// Moves a single job at `from` to a new position at `to`.
/// The job is inserted *at* index `to` (effectively placing it after the job at `to-1`).
///
/// ```text
/// BEFORE:
///    Route: ... (A) -> [from] -> (C) ... (X) -> (Y) ...
///
/// AFTER:
///    Route: ... (A) -> (C) ... (X) -> [from] -> (Y) ...
///                                      ^
///                               Inserted here
///
/// Edges Removed: (A->from), (from->C), (X->Y)
/// Edges Created: (A->C),    (X->from), (from->Y)
/// ```
#[derive(Debug)]
pub struct RelocateOperator {
    params: RelocateOperatorParams,
}

#[derive(Debug)]
pub struct RelocateOperatorParams {
    pub route_id: RouteIdx,
    pub from: usize,
    pub to: usize,
}

impl RelocateOperator {
    pub fn new(params: RelocateOperatorParams) -> Self {
        if params.from == params.to || params.from + 1 == params.to {
            panic!("RelocateOperator 'from' and 'to' positions must be different");
        }

        Self { params }
    }
}

impl LocalSearchOperator for RelocateOperator {
    #[instrument(skip_all, level = Level::TRACE)]
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

        for from in 0..route.len() {
            let job_id = route.job_id(from);

            for to in 0..=route.len() {
                if from == to || from + 1 == to {
                    continue; // no change in this case
                }

                if !neighborhood.allows_insertion(route, job_id, to) {
                    continue;
                }

                consumer(RelocateOperator::new(RelocateOperatorParams {
                    route_id: r1,
                    from,
                    to,
                }))?;
            }
        }

        ControlFlow::Continue(())
    }

    fn delta(&self, solution: &WorkingSolution) -> f64 {
        let problem = solution.problem();
        let route = solution.route(self.params.route_id);

        let a = route.previous_location_id(problem, self.params.from);
        let from = Some(route.location_id(problem, self.params.from));
        let c = route.location_id_or_end(problem, self.params.from + 1);

        let x = route.previous_location_id(problem, self.params.to);
        let y = route.location_id_or_end(problem, self.params.to);

        let current_cost = problem.travel_cost_or_zero(a, from)
            + problem.travel_cost_or_zero(from, c)
            + problem.travel_cost_or_zero(x, y);

        let new_cost = problem.travel_cost_or_zero(a, c)
            + problem.travel_cost_or_zero(x, from)
            + problem.travel_cost_or_zero(from, y);

        new_cost - current_cost
    }

    fn is_valid(&self, solution: &WorkingSolution) -> bool {
        let route = solution.route(self.params.route_id);
        let job_id = route.job_id(self.params.from);

        // A - B - C - D - E - F
        // Moving B after E, in_between_jobs will be C - D - E
        if self.params.from < self.params.to {
            let in_between_jobs = route.job_ids_iter(self.params.from + 1, self.params.to);

            // Contains C - D - E - B
            let iterator = in_between_jobs.chain(std::iter::once(job_id));
            route.is_valid_change(
                solution.problem(),
                iterator,
                self.params.from,
                self.params.to,
            )
        } else {
            // Moving E before B, in_between_jobs will be B - C - D
            let in_between_jobs = route.job_ids_iter(self.params.to, self.params.from);

            // Contains E - B - C - D
            let iterator = std::iter::once(job_id).chain(in_between_jobs);
            route.is_valid_change(
                solution.problem(),
                iterator,
                self.params.to,
                self.params.from + 1,
            )
        }
    }

    fn apply(&self, problem: &VehicleRoutingProblem, solution: &mut WorkingSolution) {
        let route = solution.route_mut(self.params.route_id);
        let job_id = route.job_id(self.params.from);

        if self.params.from < self.params.to {
            let mut job_ids = route
                .job_ids_iter(self.params.from + 1, self.params.to)
                .collect::<Vec<_>>();
            job_ids.push(job_id);
            route.replace_jobs(problem, &job_ids, self.params.from, self.params.to);
        } else {
            let job_ids = std::iter::once(job_id)
                .chain(route.job_ids_iter(self.params.to, self.params.from))
                .collect::<Vec<_>>();
            route.replace_jobs(problem, &job_ids, self.params.to, self.params.from + 1);
        }
    }

    fn updated_routes(&self) -> Vec<RouteIdx> {
        vec![self.params.route_id]
    }
}

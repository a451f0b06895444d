use fxhash::FxHashSet;
use jiff::SignedDuration;
use serde::Serialize;

use crate::{
    problem::{
        amount::Amount, job::JobIdx, vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        ls::r#move::LocalSearchMove,
        score::Score,
        solution::{
            route_id::RouteIdx,
            utils::{compute_vehicle_end, compute_vehicle_start, schedule_visit},
            working_solution::WorkingSolution,
        },
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolatedConstraint {
    Capacity,
    TimeWindow,
    VehicleTimeWindow,
    Skills,
    Unreachable,
}

/// A simulated visit, with the cumulated values once the job is served.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitEvaluation {
    pub job_id: JobIdx,
    pub arrival_time: SignedDuration,
    pub waiting_duration: SignedDuration,
    pub service_start: SignedDuration,
    pub departure_time: SignedDuration,
    pub cost: f64,
    pub distance: f64,
    pub duration: SignedDuration,
    /// Load still on board after the job is served
    pub load: Amount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteEvaluation {
    pub feasible: bool,
    pub cost: f64,
    /// Travel time only, service and waiting excluded
    pub duration: SignedDuration,
    pub distance: f64,
    /// Load on board when leaving the start
    pub load: Amount,
    pub start_time: SignedDuration,
    pub end_time: SignedDuration,
    pub visits: Vec<VisitEvaluation>,
    pub violations: Vec<ViolatedConstraint>,
}

impl RouteEvaluation {
    pub fn total_waiting_duration(&self) -> SignedDuration {
        self.visits
            .iter()
            .fold(SignedDuration::ZERO, |acc, visit| acc + visit.waiting_duration)
    }

    fn violate(&mut self, constraint: ViolatedConstraint) {
        self.feasible = false;
        if !self.violations.contains(&constraint) {
            self.violations.push(constraint);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolutionEvaluation {
    pub routes: Vec<RouteEvaluation>,
    pub unassigned: Vec<JobIdx>,
    pub cost: f64,
    /// Every job is either in exactly one route or unassigned, never both.
    pub is_partition: bool,
}

impl SolutionEvaluation {
    pub fn is_feasible(&self) -> bool {
        self.is_partition && self.routes.iter().all(|route| route.feasible)
    }

    pub fn score(&self) -> Score {
        Score::new(self.unassigned.len(), self.cost)
    }
}

/// Simulates `job_ids` for the vehicle from scratch, independently of any cached route data.
pub fn evaluate_route(
    problem: &VehicleRoutingProblem,
    vehicle_id: VehicleIdx,
    job_ids: &[JobIdx],
) -> RouteEvaluation {
    let vehicle = problem.vehicle(vehicle_id);
    let start_time = compute_vehicle_start(problem, vehicle_id);

    let mut evaluation = RouteEvaluation {
        feasible: true,
        cost: 0.0,
        duration: SignedDuration::ZERO,
        distance: 0.0,
        load: Amount::with_dimensions(vehicle.capacity().len()),
        start_time,
        end_time: start_time,
        visits: Vec::with_capacity(job_ids.len()),
        violations: vec![],
    };

    if job_ids.is_empty() {
        return evaluation;
    }

    for &job_id in job_ids {
        evaluation.load += problem.job(job_id).demand();

        if !problem.is_job_compatible_with_vehicle(vehicle_id, job_id) {
            evaluation.violate(ViolatedConstraint::Skills);
        }
    }

    if !evaluation.load.fits_in(vehicle.capacity()) {
        evaluation.violate(ViolatedConstraint::Capacity);
    }

    let mut load = evaluation.load.clone();
    let mut previous_location_id = vehicle.start_location_id();
    let mut previous_departure_time = start_time;

    for &job_id in job_ids {
        let job = problem.job(job_id);
        let location_id = Some(job.location_id());
        let visit = schedule_visit(
            problem,
            vehicle_id,
            previous_location_id,
            previous_departure_time,
            job_id,
        );

        if !visit.is_reachable {
            evaluation.violate(ViolatedConstraint::Unreachable);
        }
        if visit.misses_time_window {
            evaluation.violate(ViolatedConstraint::TimeWindow);
        }
        if visit.exceeds_shift {
            evaluation.violate(ViolatedConstraint::VehicleTimeWindow);
        }

        evaluation.cost += problem.travel_cost_or_zero(previous_location_id, location_id);
        evaluation.distance += problem.travel_distance_or_zero(previous_location_id, location_id);
        evaluation.duration += problem.travel_time_or_zero(previous_location_id, location_id);
        load -= job.demand();

        evaluation.visits.push(VisitEvaluation {
            job_id,
            arrival_time: visit.arrival_time,
            waiting_duration: visit.waiting_duration,
            service_start: visit.service_start(),
            departure_time: visit.departure_time,
            cost: evaluation.cost,
            distance: evaluation.distance,
            duration: evaluation.duration,
            load: load.clone(),
        });

        previous_location_id = location_id;
        previous_departure_time = visit.departure_time;
    }

    evaluation.end_time = previous_departure_time;

    if let Some(end_location_id) = vehicle.end_location_id() {
        if !problem.is_reachable_or_none(previous_location_id, Some(end_location_id)) {
            evaluation.violate(ViolatedConstraint::Unreachable);
        }

        evaluation.cost += problem.travel_cost_or_zero(previous_location_id, Some(end_location_id));
        evaluation.distance +=
            problem.travel_distance_or_zero(previous_location_id, Some(end_location_id));
        evaluation.duration +=
            problem.travel_time_or_zero(previous_location_id, Some(end_location_id));

        if let Some(end_time) = compute_vehicle_end(
            problem,
            vehicle_id,
            previous_location_id,
            previous_departure_time,
        ) {
            evaluation.end_time = end_time;
            if end_time > vehicle.latest_end() {
                evaluation.violate(ViolatedConstraint::VehicleTimeWindow);
            }
        }
    }

    evaluation
}

pub fn evaluate_solution(solution: &WorkingSolution) -> SolutionEvaluation {
    let problem = solution.problem();
    let mut seen = FxHashSet::default();
    let mut is_partition = true;

    let routes = solution
        .routes()
        .iter()
        .map(|route| {
            for &job_id in route.job_ids() {
                if !seen.insert(job_id) || solution.is_unassigned(job_id) {
                    is_partition = false;
                }
            }

            evaluate_route(problem, route.vehicle_id(), route.job_ids())
        })
        .collect::<Vec<_>>();

    let unassigned = solution.sorted_unassigned_jobs();
    if seen.len() + unassigned.len() != problem.jobs().len() {
        is_partition = false;
    }

    SolutionEvaluation {
        cost: routes.iter().map(|route| route.cost).sum(),
        routes,
        unassigned,
        is_partition,
    }
}

/// Cost change of inserting `job_id` at `position` in the route.
pub fn insertion_delta(
    solution: &WorkingSolution,
    route_id: RouteIdx,
    job_id: JobIdx,
    position: usize,
) -> f64 {
    solution
        .route(route_id)
        .insertion_cost_delta(solution.problem(), job_id, position)
}

/// Cost change of removing the job at `position` from the route.
pub fn removal_delta(solution: &WorkingSolution, route_id: RouteIdx, position: usize) -> f64 {
    solution
        .route(route_id)
        .removal_cost_delta(solution.problem(), position)
}

pub fn delta_cost(solution: &WorkingSolution, local_search_move: &LocalSearchMove) -> f64 {
    local_search_move.delta(solution)
}

use jiff::SignedDuration;

use crate::problem::{
    job::JobIdx, location::LocationIdx, vehicle::VehicleIdx,
    vehicle_routing_problem::VehicleRoutingProblem,
};

/// Timing of a single visit, simulated from the previous departure.
#[derive(Debug, Clone, Copy)]
pub struct ScheduledVisit {
    pub arrival_time: SignedDuration,
    pub waiting_duration: SignedDuration,
    pub departure_time: SignedDuration,
    pub is_reachable: bool,
    /// No job time window is still open at arrival.
    pub misses_time_window: bool,
    /// Service ends after the vehicle shift.
    pub exceeds_shift: bool,
}

impl ScheduledVisit {
    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.is_reachable && !self.misses_time_window && !self.exceeds_shift
    }

    #[inline]
    pub fn service_start(&self) -> SignedDuration {
        self.arrival_time.saturating_add(self.waiting_duration)
    }
}

/// The vehicle leaves its start location at the beginning of its shift. Without a start
/// location, this is the arrival time at the first job.
#[inline]
pub fn compute_vehicle_start(
    problem: &VehicleRoutingProblem,
    vehicle_id: VehicleIdx,
) -> SignedDuration {
    problem.vehicle(vehicle_id).earliest_start()
}

#[inline]
pub fn compute_arrival_time(
    problem: &VehicleRoutingProblem,
    previous_location_id: Option<LocationIdx>,
    previous_departure_time: SignedDuration,
    location_id: LocationIdx,
) -> SignedDuration {
    previous_departure_time
        .saturating_add(problem.travel_time_or_zero(previous_location_id, Some(location_id)))
}

pub fn schedule_visit(
    problem: &VehicleRoutingProblem,
    vehicle_id: VehicleIdx,
    previous_location_id: Option<LocationIdx>,
    previous_departure_time: SignedDuration,
    job_id: JobIdx,
) -> ScheduledVisit {
    let job = problem.job(job_id);
    let location_id = job.location_id();
    let is_reachable = problem.is_reachable_or_none(previous_location_id, Some(location_id));
    let arrival_time = compute_arrival_time(
        problem,
        previous_location_id,
        previous_departure_time,
        location_id,
    );

    let (service_start, misses_time_window) = match job.time_windows().service_start(arrival_time)
    {
        Some(service_start) => (service_start, false),
        None => (arrival_time, true),
    };

    let departure_time = service_start.saturating_add(job.duration());

    ScheduledVisit {
        arrival_time,
        waiting_duration: service_start - arrival_time,
        departure_time,
        is_reachable,
        misses_time_window,
        exceeds_shift: departure_time > problem.vehicle(vehicle_id).latest_end(),
    }
}

/// Arrival at the vehicle end location, `None` for open routes.
#[inline]
pub fn compute_vehicle_end(
    problem: &VehicleRoutingProblem,
    vehicle_id: VehicleIdx,
    last_location_id: Option<LocationIdx>,
    last_departure_time: SignedDuration,
) -> Option<SignedDuration> {
    let end_location_id = problem.vehicle(vehicle_id).end_location_id()?;

    Some(
        last_departure_time
            .saturating_add(problem.travel_time_or_zero(last_location_id, Some(end_location_id))),
    )
}

/// Whether the vehicle can get back to its end location, if any, within its shift.
pub fn is_vehicle_end_feasible(
    problem: &VehicleRoutingProblem,
    vehicle_id: VehicleIdx,
    last_location_id: Option<LocationIdx>,
    last_departure_time: SignedDuration,
) -> bool {
    let vehicle = problem.vehicle(vehicle_id);

    match vehicle.end_location_id() {
        None => true,
        Some(end_location_id) => {
            problem.is_reachable_or_none(last_location_id, Some(end_location_id))
                && compute_vehicle_end(problem, vehicle_id, last_location_id, last_departure_time)
                    .is_none_or(|arrival| arrival <= vehicle.latest_end())
        }
    }
}
